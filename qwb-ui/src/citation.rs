//! Citation parsing and resolution
//!
//! A suggestion carries its evidence as one raw string. That string may be
//! empty, a JSON array of references, any other JSON value, or a plain
//! comma-separated list. Parsing turns it into typed, addressable
//! [`Citation`]s without any network access; resolving a knowledge-base
//! citation into displayable content is a separate, explicit fetch
//! ([`resolve_citation`]).

use crate::client::QuestionnaireApi;
use qwb_common::api::types::KbChunk;
use serde_json::Value;
use tracing::{debug, warn};

const KB_CHUNK_PREFIX: &str = "kb_chunk:";
const ANSWER_LIBRARY_PREFIX: &str = "answer_library:";
const CHUNK_LOAD_FAILED: &str = "Failed to load chunk content.";
const EMPTY_CHUNK: &str = "(empty chunk)";
const HEADER_SEPARATOR: &str = "  ·  ";

/// What a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationKind {
    /// Chunk of an uploaded knowledge-base document
    KbChunk,
    /// Entry of the answer library
    AnswerLibrary,
    /// Anything without a recognized prefix
    Unknown,
}

/// Typed reference decoded from a suggestion's raw citation string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub kind: CitationKind,
    pub id: String,
    /// Per-kind positional label ("Chunk 1", "Library 2", "Source 1")
    pub label: String,
}

impl Citation {
    /// Identifier shortened for display (first 8 characters + "...")
    pub fn short_id(&self) -> String {
        let mut short: String = self.id.chars().take(8).collect();
        short.push_str("...");
        short
    }
}

/// Parse a raw citation string into citations, in order of appearance
///
/// Never fails. Each kind is numbered on its own ("Chunk 1", "Library 1")
/// by position *before* empty entries are dropped, so
/// `"kb_chunk:a,kb_chunk:,kb_chunk:b"` yields "Chunk 1" and "Chunk 3".
pub fn parse_citations(raw: &str) -> Vec<Citation> {
    if raw.is_empty() {
        return Vec::new();
    }

    citations_from_entries(raw_entries(raw).as_slice())
}

/// Classify an already-split list of references, numbered as in [`parse_citations`]
pub fn citations_from_entries<S: AsRef<str>>(entries: &[S]) -> Vec<Citation> {
    let mut counters = KindCounters::default();
    entries
        .iter()
        .filter_map(|entry| classify(entry.as_ref(), &mut counters))
        .collect()
}

/// Running per-kind ordinals, including entries later dropped
#[derive(Default)]
struct KindCounters {
    chunks: usize,
    library: usize,
    sources: usize,
}

/// Split the raw string into entries: JSON first, delimiter list as fallback
fn raw_entries(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(values)) => values.iter().map(entry_text).collect(),
        // A bare JSON string is unwrapped and classified, rather than shown
        // verbatim as an unknown source
        Ok(Value::String(single)) => vec![single],
        Ok(_) => vec![raw.to_string()],
        Err(_) => raw.split(',').map(str::to_string).collect(),
    }
}

fn entry_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Classify one entry by prefix; `None` when the identifier is empty
fn classify(entry: &str, counters: &mut KindCounters) -> Option<Citation> {
    let trimmed = entry.trim();

    let (kind, id, label) = if let Some(rest) = trimmed.strip_prefix(KB_CHUNK_PREFIX) {
        counters.chunks += 1;
        (CitationKind::KbChunk, rest.trim(), format!("Chunk {}", counters.chunks))
    } else if let Some(rest) = trimmed.strip_prefix(ANSWER_LIBRARY_PREFIX) {
        counters.library += 1;
        (
            CitationKind::AnswerLibrary,
            rest.trim(),
            format!("Library {}", counters.library),
        )
    } else {
        counters.sources += 1;
        (CitationKind::Unknown, trimmed, format!("Source {}", counters.sources))
    };

    if id.is_empty() {
        debug!(%label, "Dropping citation with empty identifier");
        return None;
    }

    Some(Citation {
        kind,
        id: id.to_string(),
        label,
    })
}

/// Displayable content of an opened citation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationView {
    pub heading: &'static str,
    pub label: String,
    pub short_id: String,
    /// Document header and chunk metadata lines (may be empty)
    pub header_lines: Vec<String>,
    pub body: String,
}

impl CitationView {
    fn new(citation: &Citation, header_lines: Vec<String>, body: String) -> Self {
        let heading = match citation.kind {
            CitationKind::KbChunk => "Knowledge Base Chunk",
            CitationKind::AnswerLibrary => "Answer Library Entry",
            CitationKind::Unknown => "Source",
        };
        Self {
            heading,
            label: citation.label.clone(),
            short_id: citation.short_id(),
            header_lines,
            body,
        }
    }

    /// Plain-text rendering used by the command-line front end
    pub fn render(&self) -> String {
        let mut out = format!("{} · {} · ID: {}\n", self.heading, self.label, self.short_id);
        for line in &self.header_lines {
            out.push_str(line);
            out.push('\n');
        }
        if !self.header_lines.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.body);
        out
    }
}

/// Resolve a citation into displayable content
///
/// Only knowledge-base citations hit the network. A failed fetch is
/// rendered as a degraded view, never returned as an error.
pub async fn resolve_citation(api: &dyn QuestionnaireApi, citation: &Citation) -> CitationView {
    match citation.kind {
        CitationKind::KbChunk => match api.get_kb_chunk(&citation.id).await {
            Ok(chunk) => chunk_view(citation, &chunk),
            Err(e) => {
                warn!(chunk_id = %citation.id, "Failed to load knowledge-base chunk: {}", e);
                CitationView::new(citation, Vec::new(), CHUNK_LOAD_FAILED.to_string())
            }
        },
        CitationKind::AnswerLibrary => CitationView::new(
            citation,
            Vec::new(),
            format!("Answer library entry: {}", citation.id),
        ),
        CitationKind::Unknown => CitationView::new(citation, Vec::new(), citation.id.clone()),
    }
}

/// Build the view of a fetched knowledge-base chunk
pub fn chunk_view(citation: &Citation, chunk: &KbChunk) -> CitationView {
    let mut header_lines = Vec::new();

    let header = [
        chunk.document_title.as_ref().map(|t| format!("Document: {t}")),
        chunk.document_type.as_ref().map(|t| format!("Type: {t}")),
        chunk.version_num.map(|v| format!("Version: {v}")),
        chunk.chunk_index.map(|i| format!("Chunk #{i}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if !header.is_empty() {
        header_lines.push(header.join(HEADER_SEPARATOR));
    }

    if let Some(meta) = chunk.metadata.as_ref().and_then(metadata_line) {
        header_lines.push(meta);
    }

    let body = chunk
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(EMPTY_CHUNK)
        .to_string();

    CitationView::new(citation, header_lines, body)
}

/// Summarize chunk metadata (sheet, category, type, row range)
///
/// Metadata may arrive as an object or as a JSON-encoded string; anything
/// that does not decode to an object is ignored.
fn metadata_line(metadata: &Value) -> Option<String> {
    let decoded;
    let object = match metadata {
        Value::Object(map) => map,
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => {
                decoded = map;
                &decoded
            }
            _ => {
                warn!("Ignoring malformed chunk metadata");
                return None;
            }
        },
        _ => return None,
    };

    let field = |name: &str| object.get(name).and_then(scalar_text);

    let mut parts = Vec::new();
    if let Some(sheet) = field("sheet") {
        parts.push(format!("Sheet: {sheet}"));
    }
    if let Some(category) = field("category") {
        parts.push(format!("Category: {category}"));
    }
    if let Some(kind) = field("type") {
        parts.push(format!("Type: {kind}"));
    }
    if let Some(start) = field("startRow").filter(|s| s != "0") {
        match field("endRow") {
            Some(end) => parts.push(format!("Rows: {start}–{end}")),
            None => parts.push(format!("Rows: {start}")),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(HEADER_SEPARATOR))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

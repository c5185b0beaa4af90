//! Uploaded documents and their parsed content
//!
//! Registering a document is three calls: create the document, create a
//! version (which hands back a presigned upload URL), and, once the file
//! has been PUT to that URL, mark the upload complete so processing starts.
//! The PUT itself goes straight to object storage and is not made here.

use crate::client::{QuestionnaireApi, PARSED_JSON_ARTIFACT};
use crate::error::{UiError, UiResult};
use qwb_common::api::types::{
    CreatedDocumentVersion, DocumentSummary, DocumentVersionDetail, NewDocument,
    NewDocumentVersion, ParsedDocument,
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Document types accepted by the backend
pub const DOCUMENT_TYPES: [&str; 3] = ["POLICY", "QUESTIONNAIRE", "OTHER"];

/// `source` recorded for documents registered from a local file
pub const UPLOAD_SOURCE: &str = "UPLOAD";

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub async fn list_documents(api: &dyn QuestionnaireApi) -> UiResult<Vec<DocumentSummary>> {
    let documents = api.list_documents().await?;
    debug!(count = documents.len(), "Documents listed");
    Ok(documents)
}

/// Name, size and SHA-256 of a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
}

impl FileFingerprint {
    pub async fn of(path: &Path) -> UiResult<Self> {
        let mut file = tokio::fs::File::open(path).await.map_err(qwb_common::Error::Io)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 1024 * 1024];
        let mut size_bytes = 0u64;

        loop {
            let read = file.read(&mut buffer).await.map_err(qwb_common::Error::Io)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            size_bytes += read as u64;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UiError::InvalidInput(format!("'{}' is not a file", path.display())))?;

        Ok(Self {
            filename,
            size_bytes,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

/// A registered version waiting for its file
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub document_id: Uuid,
    pub version: CreatedDocumentVersion,
}

/// Create a document and its first version
///
/// The title must not be blank and the type must be one of
/// [`DOCUMENT_TYPES`]; both are checked before any request is sent.
pub async fn register_document(
    api: &dyn QuestionnaireApi,
    title: &str,
    document_type: &str,
    file: &FileFingerprint,
    mime_type: &str,
) -> UiResult<PendingUpload> {
    let title = title.trim();
    if title.is_empty() {
        return Err(UiError::InvalidInput("Please enter a document title.".to_string()));
    }
    let document_type = document_type.trim().to_uppercase();
    if !DOCUMENT_TYPES.contains(&document_type.as_str()) {
        return Err(UiError::InvalidInput(format!(
            "unknown document type '{}' (expected one of {})",
            document_type,
            DOCUMENT_TYPES.join(", ")
        )));
    }

    let document_id = api
        .create_document(&NewDocument {
            title: title.to_string(),
            document_type,
            source: UPLOAD_SOURCE.to_string(),
        })
        .await?;

    let version = api
        .create_document_version(
            document_id,
            &NewDocumentVersion {
                original_filename: file.filename.clone(),
                mime_type: mime_type.to_string(),
                size_bytes: file.size_bytes,
                sha256: file.sha256.clone(),
            },
        )
        .await?;

    info!(
        %document_id,
        version_id = %version.document_version_id,
        size_bytes = file.size_bytes,
        "Document version registered"
    );
    Ok(PendingUpload {
        document_id,
        version,
    })
}

/// Summary lines for a document version and its artifacts
pub fn describe_version(version: &DocumentVersionDetail) -> Vec<String> {
    let mut lines = vec![format!(
        "Version {} · {} · {}",
        version.version_num,
        version.original_filename.as_deref().unwrap_or("(unnamed)"),
        version.status
    )];
    if let Some(size) = version.size_bytes {
        lines.push(format!("Size: {size} bytes"));
    }
    if let Some(sha) = version.sha256.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("SHA-256: {sha}"));
    }
    if version.artifacts.is_empty() {
        lines.push("No artifacts yet".to_string());
    }
    for artifact in &version.artifacts {
        match artifact.content_type.as_deref() {
            Some(content_type) => lines.push(format!("Artifact: {} ({content_type})", artifact.kind)),
            None => lines.push(format!("Artifact: {}", artifact.kind)),
        }
    }
    lines
}

/// One tab of the parsed-document viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTab {
    Content,
    Table(usize),
}

/// Parsed artifact of a document version with tab navigation
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub title: String,
    pub parsed: ParsedDocument,
    pub tab: DocumentTab,
}

impl DocumentView {
    /// Fetch the parsed artifact of the document's latest version
    pub async fn open(api: &dyn QuestionnaireApi, document: &DocumentSummary) -> UiResult<Self> {
        let version_id = document.latest_version_id.ok_or_else(|| {
            UiError::InvalidInput(format!("document '{}' has no version", document.title))
        })?;
        let parsed = api
            .get_artifact_content(version_id, PARSED_JSON_ARTIFACT)
            .await?;
        Ok(Self::new(document.title.clone(), parsed))
    }

    pub fn new(title: String, parsed: ParsedDocument) -> Self {
        Self {
            title,
            parsed,
            tab: DocumentTab::Content,
        }
    }

    /// Tab captions: "Content" followed by one per table
    pub fn tabs(&self) -> Vec<String> {
        std::iter::once("Content".to_string())
            .chain(self.parsed.tables.iter().enumerate().map(|(i, t)| {
                if t.title.trim().is_empty() {
                    format!("Table {}", i + 1)
                } else {
                    t.title.clone()
                }
            }))
            .collect()
    }

    /// Switch tabs; an unknown table index is ignored
    pub fn select_tab(&mut self, tab: DocumentTab) -> bool {
        match tab {
            DocumentTab::Table(i) if i >= self.parsed.tables.len() => false,
            _ => {
                self.tab = tab;
                true
            }
        }
    }

    /// Text of the active tab; tables render as tab-separated rows
    pub fn render(&self) -> String {
        match self.tab {
            DocumentTab::Content => self.parsed.content.clone(),
            DocumentTab::Table(i) => self
                .parsed
                .tables
                .get(i)
                .map(|table| {
                    table
                        .rows
                        .iter()
                        .map(|row| row.join("\t"))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default(),
        }
    }
}

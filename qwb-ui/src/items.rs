//! Item and suggestion display helpers

use qwb_common::api::{CoverageStatus, QuestionnaireItem, SuggestionRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Longest question shown in the item list
pub const QUESTION_PREVIEW_CHARS: usize = 80;

/// Question text shortened for the item list (character based)
pub fn truncate_question(text: &str) -> String {
    if text.chars().count() <= QUESTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(QUESTION_PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// Where an item came from in the imported spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub sheet: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub row: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub question_col: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub answer_col: Option<String>,
}

/// Accept strings and numbers alike ("row": 12 or "row": "12")
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl SourceLocation {
    /// Decode an item's raw source location; malformed input yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<SourceLocation>(raw) {
            Ok(location) => Some(location),
            Err(e) => {
                debug!("Ignoring malformed source location: {}", e);
                None
            }
        }
    }

    pub fn of(item: &QuestionnaireItem) -> Option<Self> {
        item.source_location.as_deref().and_then(Self::parse)
    }

    /// "Sheet: Security · Row: 12" (empty when nothing is known)
    pub fn describe(&self) -> String {
        [
            self.sheet.as_ref().map(|s| format!("Sheet: {s}")),
            self.category.as_ref().map(|c| format!("Category: {c}")),
            self.row.as_ref().map(|r| format!("Row: {r}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ")
    }
}

/// Confidence as a whole percentage, clamped to 0..=100
pub fn confidence_percent(confidence: f64) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

pub fn insufficient_evidence(suggestion: &SuggestionRecord) -> bool {
    suggestion.coverage_status == CoverageStatus::InsufficientEvidence
}

//! Free-standing questions answered by the retrieval service
//!
//! Unlike item suggestions these are not stored against a questionnaire,
//! carry no suggestion id and cannot receive feedback.

use crate::citation::{citations_from_entries, Citation};
use crate::client::QuestionnaireApi;
use crate::error::{UiError, UiResult};
use crate::items;
use qwb_common::api::types::QuestionSuggestion;
use qwb_common::api::CoverageStatus;
use tracing::info;

#[derive(Debug, Clone)]
pub struct QuestionAnswer {
    pub question: String,
    pub record: QuestionSuggestion,
}

impl QuestionAnswer {
    pub fn citations(&self) -> Vec<Citation> {
        citations_from_entries(self.record.citations.as_slice())
    }

    pub fn confidence_percent(&self) -> u8 {
        items::confidence_percent(self.record.confidence)
    }

    pub fn insufficient_evidence(&self) -> bool {
        self.record.coverage_status == CoverageStatus::InsufficientEvidence
    }
}

/// Ask the retrieval service a question; a blank question is rejected locally
pub async fn ask(api: &dyn QuestionnaireApi, question: &str) -> UiResult<QuestionAnswer> {
    let question = question.trim();
    if question.is_empty() {
        return Err(UiError::InvalidInput("question must not be empty".to_string()));
    }

    let record = api.suggest_for_question(question).await?;
    info!(
        confidence = record.confidence,
        citations = record.citations.len(),
        "Question answered"
    );
    Ok(QuestionAnswer {
        question: question.to_string(),
        record,
    })
}

//! Spreadsheet column mapping
//!
//! A mapping assigns one [`ColumnRole`] to every column of an import
//! preview. Validation is pure and runs on every submit attempt; the
//! backend is only contacted once the mapping is importable.

use crate::client::QuestionnaireApi;
use crate::error::{UiError, UiResult};
use qwb_common::api::types::{ColumnMappingRequest, ColumnRole, SpreadsheetPreview};
use qwb_common::events::{EventBus, UiEvent};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const IMPORT_FAILED: &str = "Import failed";

/// Reason a column mapping cannot be imported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Holds the number of QUESTION columns found
    #[error("exactly one Question column required")]
    QuestionColumnCount(usize),

    #[error("at least one Answer column required")]
    MissingAnswerColumn,

    #[error("column {index} out of range ({columns} columns)")]
    ColumnOutOfRange { index: usize, columns: usize },
}

/// Check a role assignment
///
/// The question rule is checked before the answer rule, so a mapping that
/// breaks both reports the question problem.
pub fn validate(roles: &[ColumnRole]) -> Result<(), MappingError> {
    let questions = roles
        .iter()
        .filter(|r| **r == ColumnRole::Question)
        .count();
    if questions != 1 {
        return Err(MappingError::QuestionColumnCount(questions));
    }

    let answers = roles
        .iter()
        .filter(|r| matches!(r, ColumnRole::Answer | ColumnRole::AnswerAndExplanation))
        .count();
    if answers == 0 {
        return Err(MappingError::MissingAnswerColumn);
    }

    Ok(())
}

/// Parse a role name as typed on the command line ("question", "answer_and_explanation", "skip", ...)
pub fn parse_role(name: &str) -> Option<ColumnRole> {
    match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "skip" => Some(ColumnRole::Skip),
        "question" => Some(ColumnRole::Question),
        "answer" => Some(ColumnRole::Answer),
        "answer_and_explanation" => Some(ColumnRole::AnswerAndExplanation),
        "explanation" => Some(ColumnRole::Explanation),
        _ => None,
    }
}

pub fn role_label(role: ColumnRole) -> &'static str {
    match role {
        ColumnRole::Skip => "Skip",
        ColumnRole::Question => "Question",
        ColumnRole::Answer => "Answer",
        ColumnRole::AnswerAndExplanation => "Answer + Explanation",
        ColumnRole::Explanation => "Explanation",
    }
}

/// One role per column, dense over `0..N`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    roles: Vec<ColumnRole>,
}

impl ColumnMapping {
    /// Mapping for `columns` columns, all SKIP
    pub fn new(columns: usize) -> Self {
        Self {
            roles: vec![ColumnRole::Skip; columns],
        }
    }

    pub fn from_roles(roles: Vec<ColumnRole>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn set_role(&mut self, index: usize, role: ColumnRole) -> Result<(), MappingError> {
        let columns = self.roles.len();
        let slot = self
            .roles
            .get_mut(index)
            .ok_or(MappingError::ColumnOutOfRange { index, columns })?;
        *slot = role;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        validate(&self.roles)
    }

    /// Wire form: column index (as a string key) to role
    pub fn to_wire(&self) -> BTreeMap<String, ColumnRole> {
        self.roles
            .iter()
            .enumerate()
            .map(|(index, role)| (index.to_string(), *role))
            .collect()
    }
}

/// One spreadsheet import in progress: preview, mapping and last error
#[derive(Debug, Clone)]
pub struct MappingSession {
    pub questionnaire_id: Uuid,
    pub object_key: String,
    pub preview: SpreadsheetPreview,
    pub mapping: ColumnMapping,
    /// Inline error shown next to the mapping form
    pub error: Option<String>,
}

impl MappingSession {
    /// Request the preview of an uploaded spreadsheet and start a mapping
    pub async fn load(
        api: &dyn QuestionnaireApi,
        questionnaire_id: Uuid,
        object_key: &str,
    ) -> UiResult<Self> {
        let preview = api.import_spreadsheet(questionnaire_id, object_key).await?;
        let object_key = preview
            .object_key
            .clone()
            .unwrap_or_else(|| object_key.to_string());
        info!(
            questionnaire_id = %questionnaire_id,
            columns = preview.preview.columns.len(),
            rows = preview.preview.rows.len(),
            "Spreadsheet preview loaded"
        );
        Ok(Self::from_preview(questionnaire_id, object_key, preview.preview))
    }

    pub fn from_preview(
        questionnaire_id: Uuid,
        object_key: String,
        preview: SpreadsheetPreview,
    ) -> Self {
        let mapping = ColumnMapping::new(preview.columns.len());
        Self {
            questionnaire_id,
            object_key,
            preview,
            mapping,
            error: None,
        }
    }

    pub fn set_role(&mut self, index: usize, role: ColumnRole) -> Result<(), MappingError> {
        self.mapping.set_role(index, role)
    }

    /// Validate and submit the mapping
    ///
    /// Validation failures never reach the backend. On any failure the
    /// mapping is kept so the user can correct or retry it.
    pub async fn submit(&mut self, api: &dyn QuestionnaireApi, events: &EventBus) -> UiResult<u32> {
        if let Err(e) = self.mapping.validate() {
            self.error = Some(e.to_string());
            return Err(UiError::Validation(e));
        }

        let request = ColumnMappingRequest {
            object_key: self.object_key.clone(),
            mappings: self.mapping.to_wire(),
        };

        match api
            .submit_column_mappings(self.questionnaire_id, &request)
            .await
        {
            Ok(result) => {
                self.error = None;
                info!(
                    questionnaire_id = %self.questionnaire_id,
                    created_items = result.created_items,
                    "Spreadsheet columns imported"
                );
                events.emit_lossy(UiEvent::ColumnsImported {
                    questionnaire_id: self.questionnaire_id,
                    created_items: result.created_items,
                });
                Ok(result.created_items)
            }
            Err(e) => {
                warn!(questionnaire_id = %self.questionnaire_id, "Column import failed: {}", e);
                self.error = Some(IMPORT_FAILED.to_string());
                events.emit_lossy(UiEvent::OperationFailed {
                    operation: "import_columns".to_string(),
                    message: e.banner(),
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }
}

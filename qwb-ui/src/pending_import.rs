//! Pending-answer review and import
//!
//! A review session lists approved answers not yet in the answer library.
//! Every answer starts selected; the user unchecks what to leave out.
//! The import call is the only serialization point: a second import of
//! the same selection finds nothing left to import.

use crate::client::QuestionnaireApi;
use crate::error::{UiError, UiResult};
use qwb_common::api::PendingAnswer;
use qwb_common::events::{EventBus, UiEvent};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

const IMPORT_FAILED: &str = "Failed to import answers";

/// Result of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub requested: usize,
    pub imported: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    answers: Vec<PendingAnswer>,
    selected: HashSet<Uuid>,
    pub error: Option<String>,
}

impl ReviewSession {
    /// Start a review over `answers` with all of them selected
    pub fn new(answers: Vec<PendingAnswer>) -> Self {
        let selected = answers.iter().map(|a| a.response_id).collect();
        Self {
            answers,
            selected,
            error: None,
        }
    }

    /// Fetch the pending answers and start a review
    pub async fn open(api: &dyn QuestionnaireApi) -> UiResult<Self> {
        let answers = api.list_pending_answers().await?;
        info!(pending = answers.len(), "Pending answers loaded for review");
        Ok(Self::new(answers))
    }

    pub fn answers(&self) -> &[PendingAnswer] {
        &self.answers
    }

    pub fn is_selected(&self, response_id: Uuid) -> bool {
        self.selected.contains(&response_id)
    }

    /// Flip one answer's selection; unknown ids are ignored
    pub fn toggle(&mut self, response_id: Uuid) {
        if !self.answers.iter().any(|a| a.response_id == response_id) {
            return;
        }
        if !self.selected.remove(&response_id) {
            self.selected.insert(response_id);
        }
    }

    /// Select everything, or clear when everything is already selected
    pub fn toggle_all(&mut self) {
        if self.is_all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.answers.iter().map(|a| a.response_id).collect();
        }
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_all_selected(&self) -> bool {
        !self.answers.is_empty() && self.selected.len() == self.answers.len()
    }

    /// The import action is disabled for an empty selection
    pub fn can_import(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn import_caption(&self) -> String {
        let n = self.selected_count();
        if n == 1 {
            "Import 1 answer".to_string()
        } else {
            format!("Import {n} answers")
        }
    }

    /// Selected response ids, in list order
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.answers
            .iter()
            .map(|a| a.response_id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Import the selected answers as one request
    ///
    /// Success clears the review; failure leaves it untouched so the same
    /// selection can be retried.
    pub async fn import(
        &mut self,
        api: &dyn QuestionnaireApi,
        events: &EventBus,
    ) -> UiResult<ImportOutcome> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(UiError::EmptySelection);
        }

        match api.import_pending_answers(&ids).await {
            Ok(imported) => {
                info!(requested = ids.len(), imported, "Pending answers imported");
                self.answers.clear();
                self.selected.clear();
                self.error = None;
                events.emit_lossy(UiEvent::AnswersImported {
                    requested: ids.len(),
                    imported,
                });
                Ok(ImportOutcome {
                    requested: ids.len(),
                    imported,
                })
            }
            Err(e) => {
                warn!(requested = ids.len(), "Pending answer import failed: {}", e);
                self.error = Some(IMPORT_FAILED.to_string());
                events.emit_lossy(UiEvent::OperationFailed {
                    operation: "import_answers".to_string(),
                    message: e.banner(),
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }
}

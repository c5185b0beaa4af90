//! Questionnaire list with pending-answer badge

use crate::client::QuestionnaireApi;
use crate::error::{UiError, UiResult};
use crate::pending_import::{ImportOutcome, ReviewSession};
use qwb_common::api::types::{NewQuestionnaire, QuestionnaireSummary, QuestionnaireType};
use qwb_common::api::QuestionnaireStatus;
use qwb_common::events::{EventBus, UiEvent};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct QuestionnaireList {
    api: Arc<dyn QuestionnaireApi>,
    events: EventBus,
    questionnaires: Vec<QuestionnaireSummary>,
    pending_count: u64,
    /// Sent to the server with every refresh
    pub status_filter: Option<QuestionnaireStatus>,
    /// Applied locally to the fetched list
    pub search: String,
}

impl QuestionnaireList {
    pub fn new(api: Arc<dyn QuestionnaireApi>, events: EventBus) -> Self {
        Self {
            api,
            events,
            questionnaires: Vec::new(),
            pending_count: 0,
            status_filter: None,
            search: String::new(),
        }
    }

    pub fn questionnaires(&self) -> &[QuestionnaireSummary] {
        &self.questionnaires
    }

    pub fn pending_count(&self) -> u64 {
        self.pending_count
    }

    /// Questionnaires whose name contains the search text (case-insensitive)
    pub fn visible(&self) -> Vec<&QuestionnaireSummary> {
        let needle = self.search.trim().to_lowercase();
        self.questionnaires
            .iter()
            .filter(|q| needle.is_empty() || q.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Fetch the list and the pending count together
    ///
    /// Both succeed or the previous state is kept.
    pub async fn refresh(&mut self) -> UiResult<()> {
        let result = tokio::try_join!(
            self.api.list_questionnaires(self.status_filter),
            self.api.pending_answer_count()
        );

        match result {
            Ok((questionnaires, count)) => {
                info!(
                    questionnaires = questionnaires.len(),
                    pending = count,
                    "Questionnaire list refreshed"
                );
                self.questionnaires = questionnaires;
                if count != self.pending_count {
                    self.events
                        .emit_lossy(UiEvent::PendingCountChanged { count });
                }
                self.pending_count = count;
                Ok(())
            }
            Err(e) => {
                warn!("Questionnaire list refresh failed: {}", e);
                self.events.emit_lossy(UiEvent::OperationFailed {
                    operation: "refresh_list".to_string(),
                    message: e.banner(),
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }

    /// Create a spreadsheet questionnaire; a blank name sends nothing
    pub async fn create(&mut self, name: &str) -> UiResult<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UiError::InvalidInput(
                "questionnaire name must not be blank".to_string(),
            ));
        }

        let request = NewQuestionnaire {
            name: name.to_string(),
            questionnaire_type: QuestionnaireType::Spreadsheet,
            due_date: None,
            owner_user_id: None,
        };
        let id = self.api.create_questionnaire(&request).await?;
        info!(questionnaire_id = %id, name, "Questionnaire created");

        if let Err(e) = self.refresh().await {
            warn!("List refresh after create failed: {}", e);
        }
        Ok(id)
    }

    /// Open a review over the current pending answers
    pub async fn review_pending(&self) -> UiResult<ReviewSession> {
        ReviewSession::open(self.api.as_ref()).await
    }

    /// Import the reviewed selection, then refresh the list and the count
    pub async fn import_reviewed(&mut self, review: &mut ReviewSession) -> UiResult<ImportOutcome> {
        let outcome = review.import(self.api.as_ref(), &self.events).await?;
        if let Err(e) = self.refresh().await {
            warn!("List refresh after import failed: {}", e);
        }
        Ok(outcome)
    }
}

//! Questionnaire orchestrator
//!
//! Drives one questionnaire's fetch/refresh cycle, suggestion requests,
//! saves, feedback, citation lookups and completion. State lives in a
//! [`QuestionnaireSession`]; the session lock is never held across a
//! network call, so the user can keep interacting while a request runs.
//!
//! Failures are scoped to the operation that caused them: each one is
//! returned to the caller and published as `UiEvent::OperationFailed`.
//! A suggestion response that arrives for an item that is no longer
//! selected, or after a newer request, is dropped without an event.

mod session;

pub use session::{
    QuestionnaireSession, StaleReason, Suggestion, SuggestionOutcome, SuggestionTicket,
};

use crate::citation::{resolve_citation, Citation, CitationView};
use crate::client::QuestionnaireApi;
use crate::confirm::Confirm;
use crate::error::{UiError, UiResult};
use crate::response_state::{ResponseAction, ResponseTransition};
use qwb_common::api::types::FeedbackRequest;
use qwb_common::api::{FeedbackThumb, ResponseStatus};
use qwb_common::events::{EventBus, UiEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prompt shown before completing a questionnaire
pub const COMPLETE_PROMPT: &str = "Import approved answers to your answer library?";

pub struct Orchestrator {
    api: Arc<dyn QuestionnaireApi>,
    confirm: Arc<dyn Confirm>,
    events: EventBus,
    session: Mutex<QuestionnaireSession>,
}

impl Orchestrator {
    pub fn new(
        api: Arc<dyn QuestionnaireApi>,
        confirm: Arc<dyn Confirm>,
        events: EventBus,
        questionnaire_id: Uuid,
    ) -> Self {
        Self {
            api,
            confirm,
            events,
            session: Mutex::new(QuestionnaireSession::new(questionnaire_id)),
        }
    }

    /// Create and load in one step
    pub async fn open(
        api: Arc<dyn QuestionnaireApi>,
        confirm: Arc<dyn Confirm>,
        events: EventBus,
        questionnaire_id: Uuid,
    ) -> UiResult<Self> {
        let orchestrator = Self::new(api, confirm, events, questionnaire_id);
        orchestrator.load().await?;
        Ok(orchestrator)
    }

    pub async fn questionnaire_id(&self) -> Uuid {
        self.session.lock().await.questionnaire_id()
    }

    /// Copy of the current session state
    pub async fn snapshot(&self) -> QuestionnaireSession {
        self.session.lock().await.clone()
    }

    fn report(&self, operation: &str, error: &UiError) {
        warn!(operation, "Operation failed: {}", error);
        self.events.emit_lossy(UiEvent::OperationFailed {
            operation: operation.to_string(),
            message: error.banner(),
            retryable: error.is_retryable(),
        });
    }

    /// Fetch the questionnaire and its items
    pub async fn load(&self) -> UiResult<()> {
        let questionnaire_id = self.questionnaire_id().await;

        let detail = match self.api.get_questionnaire(questionnaire_id).await {
            Ok(detail) => detail,
            Err(e) => {
                self.report("load_questionnaire", &e);
                return Err(e);
            }
        };

        let (item_count, first_load, before, after) = {
            let mut session = self.session.lock().await;
            let first_load = session.summary().is_none();
            let before = session.selected_item_id();
            session.apply_detail(detail);
            (session.items().len(), first_load, before, session.selected_item_id())
        };

        debug!(questionnaire_id = %questionnaire_id, item_count, "Questionnaire loaded");
        self.events.emit_lossy(UiEvent::QuestionnaireLoaded {
            questionnaire_id,
            item_count,
        });
        if first_load || before != after {
            self.events.emit_lossy(UiEvent::ItemSelected {
                questionnaire_id,
                item_id: after,
            });
        }
        Ok(())
    }

    pub async fn refresh(&self) -> UiResult<()> {
        self.load().await
    }

    /// Select the item at `index`; see [`QuestionnaireSession::select`]
    pub async fn select_item(&self, index: usize) -> UiResult<bool> {
        let (questionnaire_id, changed, item_id) = {
            let mut session = self.session.lock().await;
            let changed = session.select(index).ok_or_else(|| {
                UiError::InvalidInput(format!(
                    "item {} out of range ({} items)",
                    index,
                    session.items().len()
                ))
            })?;
            (session.questionnaire_id(), changed, session.selected_item_id())
        };

        if changed {
            self.events.emit_lossy(UiEvent::ItemSelected {
                questionnaire_id,
                item_id,
            });
        }
        Ok(changed)
    }

    pub async fn set_answer_text(&self, text: impl Into<String>) {
        self.session.lock().await.set_answer_text(text);
    }

    pub async fn set_explanation(&self, text: impl Into<String>) {
        self.session.lock().await.set_explanation(text);
    }

    /// Request a suggestion for the selected item
    ///
    /// A stale response (selection moved, or a newer request was issued)
    /// is discarded and reported as `Ok(Stale(..))`, never as an error.
    pub async fn request_suggestion(&self) -> UiResult<SuggestionOutcome> {
        let (questionnaire_id, ticket) = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_suggestion().ok_or(UiError::NoItemSelected)?;
            (session.questionnaire_id(), ticket)
        };
        debug!(
            questionnaire_id = %questionnaire_id,
            item_id = %ticket.item_id,
            token = ticket.token,
            "Requesting suggestion"
        );

        let result = self
            .api
            .suggest_answer(questionnaire_id, ticket.item_id)
            .await;

        match result {
            Ok(record) => {
                let suggestion_id = record.suggestion_id;
                let outcome = self.session.lock().await.finish_suggestion(ticket, record);
                match outcome {
                    SuggestionOutcome::Applied => {
                        info!(item_id = %ticket.item_id, %suggestion_id, "Suggestion applied");
                        self.events.emit_lossy(UiEvent::SuggestionApplied {
                            item_id: ticket.item_id,
                            suggestion_id,
                        });
                    }
                    SuggestionOutcome::Stale(reason) => {
                        debug!(
                            item_id = %ticket.item_id,
                            token = ticket.token,
                            ?reason,
                            "Discarding stale suggestion"
                        );
                    }
                }
                Ok(outcome)
            }
            Err(e) => match self.session.lock().await.fail_suggestion(ticket) {
                Ok(()) => {
                    self.report("suggest_answer", &e);
                    Err(e)
                }
                Err(reason) => {
                    debug!(item_id = %ticket.item_id, ?reason, "Ignoring failure of stale suggestion request: {}", e);
                    Ok(SuggestionOutcome::Stale(reason))
                }
            },
        }
    }

    /// Persist the current answer text with `status`
    pub async fn save(&self, status: ResponseStatus) -> UiResult<ResponseTransition> {
        self.perform(ResponseAction::from_status(status)).await
    }

    pub async fn save_draft(&self) -> UiResult<ResponseTransition> {
        self.perform(ResponseAction::SaveDraft).await
    }

    pub async fn submit_for_review(&self) -> UiResult<ResponseTransition> {
        self.perform(ResponseAction::SubmitForReview).await
    }

    pub async fn approve(&self) -> UiResult<ResponseTransition> {
        self.perform(ResponseAction::Approve).await
    }

    /// Apply a saving action to the selected item
    ///
    /// On failure the typed text stays in place for a retry. On success
    /// the questionnaire is re-fetched.
    async fn perform(&self, action: ResponseAction) -> UiResult<ResponseTransition> {
        let status = action.persisted_status().ok_or_else(|| {
            UiError::InvalidInput(format!("{action:?} does not save a response"))
        })?;

        let (questionnaire_id, item_id, old_state, request) = {
            let session = self.session.lock().await;
            let item = session.selected_item().ok_or(UiError::NoItemSelected)?;
            (
                session.questionnaire_id(),
                item.id,
                item.current_state,
                session.save_request(status),
            )
        };

        if let Err(e) = self
            .api
            .save_response(questionnaire_id, item_id, &request)
            .await
        {
            self.report("save_response", &e);
            return Err(e);
        }

        let transition = {
            let mut session = self.session.lock().await;
            let old = session.record_saved(item_id, action).unwrap_or(old_state);
            ResponseTransition::new(item_id, old, action, status)
        };
        info!(
            questionnaire_id = %questionnaire_id,
            item_id = %item_id,
            old_state = ?transition.old_state,
            new_state = ?transition.new_state,
            "Response saved"
        );
        self.events
            .emit_lossy(UiEvent::ResponseSaved { item_id, status });

        // The save already succeeded; a failed refresh is reported on its own
        let _ = self.load().await;
        Ok(transition)
    }

    /// Thumbs feedback on the displayed suggestion; `Ok(false)` when there is none
    pub async fn send_feedback(&self, thumb: FeedbackThumb) -> UiResult<bool> {
        let suggestion_id = {
            let session = self.session.lock().await;
            match session.suggestion() {
                Some(s) => s.record.suggestion_id,
                None => return Ok(false),
            }
        };

        let request = FeedbackRequest {
            suggestion_id,
            thumb,
            comment: None,
        };
        match self.api.send_feedback(&request).await {
            Ok(()) => {
                debug!(%suggestion_id, ?thumb, "Feedback sent");
                Ok(true)
            }
            Err(e) => {
                self.report("send_feedback", &e);
                Err(e)
            }
        }
    }

    /// Resolve a citation of the displayed suggestion
    pub async fn open_citation(&self, citation: &Citation) -> CitationView {
        resolve_citation(self.api.as_ref(), citation).await
    }

    /// Complete the questionnaire
    ///
    /// Asks whether approved answers should also be imported into the
    /// answer library, then completes and re-fetches. Returns the answer
    /// to that question.
    pub async fn complete(&self) -> UiResult<bool> {
        let (questionnaire_id, eligible) = {
            let session = self.session.lock().await;
            (
                session.questionnaire_id(),
                session.progress().eligible_for_library,
            )
        };
        debug!(questionnaire_id = %questionnaire_id, eligible, "Completing questionnaire");
        let import_to_library = self.confirm.confirm(COMPLETE_PROMPT).await;

        if let Err(e) = self
            .api
            .complete_questionnaire(questionnaire_id, import_to_library)
            .await
        {
            self.report("complete_questionnaire", &e);
            return Err(e);
        }

        info!(questionnaire_id = %questionnaire_id, import_to_library, "Questionnaire completed");
        self.events.emit_lossy(UiEvent::QuestionnaireCompleted {
            questionnaire_id,
            imported_to_library: import_to_library,
        });

        let _ = self.load().await;
        match self.api.pending_answer_count().await {
            Ok(count) => self.events.emit_lossy(UiEvent::PendingCountChanged { count }),
            Err(e) => warn!("Failed to refresh pending answer count: {}", e),
        }
        Ok(import_to_library)
    }
}

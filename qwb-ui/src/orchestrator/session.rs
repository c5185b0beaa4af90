//! Per-questionnaire UI state with pure transitions
//!
//! Holds the loaded items, the selected item, the live suggestion and the
//! unsaved answer text. Nothing here performs I/O; [`super::Orchestrator`]
//! drives the network calls and feeds their results back in.
//!
//! Suggestion requests are tagged with a [`SuggestionTicket`] (item id +
//! monotonically increasing token). A response is applied only when its
//! ticket is the latest one issued and its item is still selected.

use crate::citation::{parse_citations, Citation};
use crate::items;
use crate::response_state::{displayed_state, next_state, ProgressSummary, ResponseAction};
use qwb_common::api::types::{QuestionnaireDetail, QuestionnaireSummary, SaveResponseRequest};
use qwb_common::api::{ItemState, QuestionnaireItem, ResponseStatus, SuggestionRecord};
use tracing::debug;
use uuid::Uuid;

/// Suggestion displayed for the selected item
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub item_id: Uuid,
    pub record: SuggestionRecord,
}

impl Suggestion {
    pub fn confidence_percent(&self) -> u8 {
        items::confidence_percent(self.record.confidence)
    }

    pub fn insufficient_evidence(&self) -> bool {
        items::insufficient_evidence(&self.record)
    }

    /// Parsed from the raw string on every call; never cached
    pub fn citations(&self) -> Vec<Citation> {
        parse_citations(&self.record.citations)
    }
}

/// Identifies one in-flight suggestion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub item_id: Uuid,
    pub token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// The selection moved to another item
    ItemChanged,
    /// A newer request was issued for the same item
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOutcome {
    Applied,
    Stale(StaleReason),
}

#[derive(Debug, Clone)]
pub struct QuestionnaireSession {
    questionnaire_id: Uuid,
    summary: Option<QuestionnaireSummary>,
    items: Vec<QuestionnaireItem>,
    selected_index: Option<usize>,
    suggestion: Option<Suggestion>,
    answer_text: String,
    explanation: String,
    next_token: u64,
    in_flight: Option<SuggestionTicket>,
}

impl QuestionnaireSession {
    pub fn new(questionnaire_id: Uuid) -> Self {
        Self {
            questionnaire_id,
            summary: None,
            items: Vec::new(),
            selected_index: None,
            suggestion: None,
            answer_text: String::new(),
            explanation: String::new(),
            next_token: 1,
            in_flight: None,
        }
    }

    pub fn questionnaire_id(&self) -> Uuid {
        self.questionnaire_id
    }

    pub fn summary(&self) -> Option<&QuestionnaireSummary> {
        self.summary.as_ref()
    }

    pub fn items(&self) -> &[QuestionnaireItem] {
        &self.items
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_item(&self) -> Option<&QuestionnaireItem> {
        self.selected_index.and_then(|i| self.items.get(i))
    }

    pub fn selected_item_id(&self) -> Option<Uuid> {
        self.selected_item().map(|item| item.id)
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.suggestion.as_ref()
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_suggesting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// State badge of the selected item, SUGGESTED included
    pub fn selected_display_state(&self) -> Option<ItemState> {
        self.selected_item()
            .map(|item| displayed_state(item.current_state, self.suggestion.is_some()))
    }

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::from_items(&self.items)
    }

    /// Install a freshly fetched questionnaire
    ///
    /// The selection keeps its index (clamped to the new item count). If
    /// that lands on a different item, the live suggestion and draft text
    /// are discarded like a manual reselect.
    pub fn apply_detail(&mut self, detail: QuestionnaireDetail) {
        let previous_id = self.selected_item_id();

        self.summary = Some(detail.questionnaire);
        self.items = detail.items;
        self.selected_index = if self.items.is_empty() {
            None
        } else {
            Some(self.selected_index.unwrap_or(0).min(self.items.len() - 1))
        };

        if previous_id.is_some() && previous_id != self.selected_item_id() {
            self.discard_ephemeral();
        }
    }

    /// Select the item at `index`
    ///
    /// Returns whether the selection changed, `None` for an index out of
    /// range. Moving to another item drops the suggestion and unsaved text
    /// without asking; reselecting the current item keeps them.
    pub fn select(&mut self, index: usize) -> Option<bool> {
        if index >= self.items.len() {
            return None;
        }
        if self.selected_index == Some(index) {
            return Some(false);
        }
        self.selected_index = Some(index);
        self.discard_ephemeral();
        Some(true)
    }

    fn discard_ephemeral(&mut self) {
        if !self.answer_text.is_empty() || !self.explanation.is_empty() {
            debug!(
                questionnaire_id = %self.questionnaire_id,
                answer_chars = self.answer_text.chars().count(),
                explanation_chars = self.explanation.chars().count(),
                "Discarding unsaved answer text"
            );
        }
        self.suggestion = None;
        self.answer_text.clear();
        self.explanation.clear();
        self.in_flight = None;
    }

    /// Issue a ticket for a suggestion request on the selected item
    ///
    /// The displayed suggestion is cleared while the request is pending.
    pub fn begin_suggestion(&mut self) -> Option<SuggestionTicket> {
        let item_id = self.selected_item_id()?;
        let ticket = SuggestionTicket {
            item_id,
            token: self.next_token,
        };
        self.next_token += 1;
        self.suggestion = None;
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    fn check_ticket(&self, ticket: SuggestionTicket) -> Result<(), StaleReason> {
        if self.selected_item_id() != Some(ticket.item_id) {
            Err(StaleReason::ItemChanged)
        } else if self.in_flight != Some(ticket) {
            Err(StaleReason::Superseded)
        } else {
            Ok(())
        }
    }

    /// Apply a suggestion response if its ticket is still current
    pub fn finish_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        record: SuggestionRecord,
    ) -> SuggestionOutcome {
        if let Err(reason) = self.check_ticket(ticket) {
            return SuggestionOutcome::Stale(reason);
        }
        self.in_flight = None;
        self.answer_text = record.answer_text.clone();
        self.suggestion = Some(Suggestion {
            item_id: ticket.item_id,
            record,
        });
        SuggestionOutcome::Applied
    }

    /// Close a failed request; `Err` when the failure no longer matters
    pub fn fail_suggestion(&mut self, ticket: SuggestionTicket) -> Result<(), StaleReason> {
        self.check_ticket(ticket)?;
        self.in_flight = None;
        Ok(())
    }

    pub fn set_answer_text(&mut self, text: impl Into<String>) {
        self.answer_text = text.into();
    }

    pub fn set_explanation(&mut self, text: impl Into<String>) {
        self.explanation = text.into();
    }

    /// Request body for saving the current text; a blank explanation is omitted
    pub fn save_request(&self, status: ResponseStatus) -> SaveResponseRequest {
        let explanation = if self.explanation.trim().is_empty() {
            None
        } else {
            Some(self.explanation.clone())
        };
        SaveResponseRequest {
            answer_text: self.answer_text.clone(),
            explanation,
            status,
        }
    }

    /// Reflect a successful save locally until the next refresh
    ///
    /// Returns the state the item had before `action`.
    pub fn record_saved(&mut self, item_id: Uuid, action: ResponseAction) -> Option<ItemState> {
        let item = self.items.iter_mut().find(|item| item.id == item_id)?;
        let old = item.current_state;
        item.current_state = next_state(old, action);
        Some(old)
    }
}

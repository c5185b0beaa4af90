//! Response state machine
//!
//! Persisted lifecycle of one item's answer:
//! UNANSWERED → SUGGESTED → DRAFTED → NEEDS_REVIEW → APPROVED
//!
//! SUGGESTED is display-only. Requesting a suggestion never changes the
//! persisted state; only a save does. Saves are legal from every state,
//! including APPROVED (re-saving with a lower status is accepted).

use chrono::{DateTime, Utc};
use qwb_common::api::{ItemState, QuestionnaireItem, ResponseStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// User action on a questionnaire item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseAction {
    RequestSuggestion,
    SaveDraft,
    SubmitForReview,
    Approve,
}

impl ResponseAction {
    /// Status written by this action, `None` for actions that persist nothing
    pub fn persisted_status(self) -> Option<ResponseStatus> {
        match self {
            ResponseAction::RequestSuggestion => None,
            ResponseAction::SaveDraft => Some(ResponseStatus::Draft),
            ResponseAction::SubmitForReview => Some(ResponseStatus::NeedsReview),
            ResponseAction::Approve => Some(ResponseStatus::Approved),
        }
    }

    pub fn from_status(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Draft => ResponseAction::SaveDraft,
            ResponseStatus::NeedsReview => ResponseAction::SubmitForReview,
            ResponseStatus::Approved => ResponseAction::Approve,
        }
    }
}

/// Persisted state reached by a successful save with `status`
pub fn state_for_status(status: ResponseStatus) -> ItemState {
    match status {
        ResponseStatus::Draft => ItemState::Drafted,
        ResponseStatus::NeedsReview => ItemState::NeedsReview,
        ResponseStatus::Approved => ItemState::Approved,
    }
}

/// Persisted state after `action` succeeds; every action is legal in every state
pub fn next_state(current: ItemState, action: ResponseAction) -> ItemState {
    match action.persisted_status() {
        Some(status) => state_for_status(status),
        None => current,
    }
}

/// State shown to the user
///
/// A live suggestion shows as SUGGESTED only over an unanswered item; a
/// saved answer always outranks an unsaved suggestion.
pub fn displayed_state(persisted: ItemState, has_live_suggestion: bool) -> ItemState {
    if has_live_suggestion && persisted == ItemState::Unanswered {
        ItemState::Suggested
    } else {
        persisted
    }
}

/// Display helpers on [`ItemState`]
pub trait ItemStateExt {
    fn label(&self) -> &'static str;
    /// Approved answers can be promoted to the answer library
    fn is_import_eligible(&self) -> bool;
}

impl ItemStateExt for ItemState {
    fn label(&self) -> &'static str {
        match self {
            ItemState::Unanswered => "Unanswered",
            ItemState::Suggested => "Suggested",
            ItemState::Drafted => "Draft",
            ItemState::NeedsReview => "Needs Review",
            ItemState::Approved => "Approved",
        }
    }

    fn is_import_eligible(&self) -> bool {
        *self == ItemState::Approved
    }
}

/// Record of a persisted transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTransition {
    pub item_id: Uuid,
    pub old_state: ItemState,
    pub new_state: ItemState,
    pub status: ResponseStatus,
    pub transitioned_at: DateTime<Utc>,
}

impl ResponseTransition {
    /// Record `action` applied to an item in `old_state`, persisted with `status`
    pub fn new(
        item_id: Uuid,
        old_state: ItemState,
        action: ResponseAction,
        status: ResponseStatus,
    ) -> Self {
        Self {
            item_id,
            old_state,
            new_state: next_state(old_state, action),
            status,
            transitioned_at: Utc::now(),
        }
    }
}

/// Per-state item counts of a questionnaire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: usize,
    pub counts: BTreeMap<&'static str, usize>,
    /// Items whose answers can be promoted to the answer library
    pub eligible_for_library: usize,
}

impl ProgressSummary {
    pub fn from_items(items: &[QuestionnaireItem]) -> Self {
        let mut counts: BTreeMap<&'static str, usize> =
            ItemState::ALL.iter().map(|s| (s.label(), 0)).collect();
        for item in items {
            *counts.entry(item.current_state.label()).or_default() += 1;
        }
        Self {
            total: items.len(),
            counts,
            eligible_for_library: items
                .iter()
                .filter(|item| item.current_state.is_import_eligible())
                .count(),
        }
    }

    pub fn count(&self, state: ItemState) -> usize {
        self.counts.get(state.label()).copied().unwrap_or(0)
    }

    /// "3/10 approved · 2 draft · 1 needs review"
    pub fn render(&self) -> String {
        let mut parts = vec![format!(
            "{}/{} approved",
            self.count(ItemState::Approved),
            self.total
        )];
        for state in [ItemState::Drafted, ItemState::NeedsReview, ItemState::Unanswered] {
            let n = self.count(state);
            if n > 0 {
                parts.push(format!("{} {}", n, state.label().to_lowercase()));
            }
        }
        parts.join(" · ")
    }
}

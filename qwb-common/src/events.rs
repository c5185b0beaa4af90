//! Event types and EventBus for QWB
//!
//! Workflow components publish `UiEvent`s so that any front end (CLI,
//! terminal UI, tests) can react to state changes without polling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// QWB event types
///
/// Events are broadcast via EventBus and are serializable so they can be
/// forwarded to other processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    /// Questionnaire items fetched (initial load or refresh)
    QuestionnaireLoaded {
        questionnaire_id: Uuid,
        item_count: usize,
    },

    /// A different item became the selected item
    ItemSelected {
        questionnaire_id: Uuid,
        /// `None` when the questionnaire has no items
        item_id: Option<Uuid>,
    },

    /// A suggestion response was applied to the selected item
    SuggestionApplied {
        item_id: Uuid,
        suggestion_id: Uuid,
    },

    /// A response was persisted for an item
    ResponseSaved {
        item_id: Uuid,
        status: crate::api::ResponseStatus,
    },

    /// Questionnaire marked complete
    QuestionnaireCompleted {
        questionnaire_id: Uuid,
        imported_to_library: bool,
    },

    /// Spreadsheet columns imported as questionnaire items
    ColumnsImported {
        questionnaire_id: Uuid,
        created_items: u32,
    },

    /// Pending answers promoted into the answer library
    AnswersImported { requested: usize, imported: u32 },

    /// Pending-answer count refreshed
    PendingCountChanged { count: u64 },

    /// An operation failed; front ends show this as an error banner
    OperationFailed {
        operation: String,
        message: String,
        retryable: bool,
    },
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use qwb_common::events::{EventBus, UiEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(UiEvent::PendingCountChanged { count: 3 });
/// assert_eq!(rx.try_recv().unwrap(), UiEvent::PendingCountChanged { count: 3 });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: UiEvent) -> Result<usize, broadcast::error::SendError<UiEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

//! qwb-ui library interface
//!
//! Questionnaire workbench client core: citation parsing, column mapping,
//! the response state machine, pending-answer import and the
//! per-questionnaire orchestrator, all behind the [`QuestionnaireApi`]
//! port so they can be driven by the CLI or by tests.

pub mod ask;
pub mod citation;
pub mod client;
pub mod column_mapping;
pub mod confirm;
pub mod documents;
pub mod error;
pub mod items;
pub mod list;
pub mod orchestrator;
pub mod pending_import;
pub mod response_state;

pub use crate::client::{HttpApiClient, QuestionnaireApi};
pub use crate::error::{UiError, UiResult};

use qwb_common::events::EventBus;
use std::sync::Arc;

/// State shared by every front-end command
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn QuestionnaireApi>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(api: Arc<dyn QuestionnaireApi>, event_bus: EventBus) -> Self {
        Self { api, event_bus }
    }
}

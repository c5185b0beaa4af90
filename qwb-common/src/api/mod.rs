//! API module for the questionnaire REST interface
//!
//! Contains ONLY shared wire types (no HTTP client). The client crate wraps
//! these with its transport.

pub mod types;

pub use types::{
    ColumnRole, CoverageStatus, FeedbackThumb, ItemState, PendingAnswer, QuestionnaireItem,
    QuestionnaireStatus, ResponseStatus, SuggestionRecord,
};

//! Error types for qwb-ui
//!
//! Every failure is scoped to the operation that triggered it:
//! - transport and API failures become a generic, retryable banner
//! - validation failures carry a specific, actionable message
//! - malformed payloads surface only when nothing can be displayed

use crate::column_mapping::MappingError;
use thiserror::Error;

/// Client-side error type
#[derive(Debug, Error)]
pub enum UiError {
    /// Network failure (connection refused, timeout, reset)
    #[error("Network error: {0}")]
    Transport(String),

    /// Backend rejected the credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Column mapping rejected locally, no request sent
    #[error(transparent)]
    Validation(#[from] MappingError),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Import attempted with nothing selected
    #[error("No answers selected for import")]
    EmptySelection,

    /// Item action attempted while the questionnaire has no items
    #[error("No questionnaire item selected")]
    NoItemSelected,

    /// Invalid user input (blank name, unknown index, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// qwb-common error
    #[error("Common error: {0}")]
    Common(#[from] qwb_common::Error),
}

impl UiError {
    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            UiError::Transport(_) => true,
            UiError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Short message for the error banner
    ///
    /// Transport and server failures get a generic message; local
    /// validation failures keep their specific text.
    pub fn banner(&self) -> String {
        match self {
            UiError::Transport(_) => "Network error. Check your connection and retry.".to_string(),
            UiError::Api { status, .. } if *status >= 500 => {
                "The server failed to process the request. Please retry.".to_string()
            }
            UiError::Api { message, .. } => message.clone(),
            UiError::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            UiError::Malformed(_) => "Unexpected response from the server.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for client operations
pub type UiResult<T> = Result<T, UiError>;

impl From<reqwest::Error> for UiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UiError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            UiError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            UiError::Transport(err.to_string())
        }
    }
}

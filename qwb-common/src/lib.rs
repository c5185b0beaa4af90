//! # QWB Common Library
//!
//! Shared code for the questionnaire workbench crates:
//! - API request/response types
//! - Event types (UiEvent) and EventBus
//! - Configuration loading
//! - Error types

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};

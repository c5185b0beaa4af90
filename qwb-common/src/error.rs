//! Common error types for QWB

use thiserror::Error;

/// Common result type for QWB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the QWB crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration file could not be parsed
    #[error("Invalid TOML configuration: {0}")]
    TomlParse(#[from] toml::de::Error),
}

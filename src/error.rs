//! Error types for the Codepulse service.

use thiserror::Error;

/// Main error type for Codepulse operations.
#[derive(Error, Debug)]
pub enum CodepulseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request store errors
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Codepulse operations.
pub type Result<T> = std::result::Result<T, CodepulseError>;

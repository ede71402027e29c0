// crates/wayfarer-server/src/error.rs
// Standardized error types for the tool adapters

use thiserror::Error;

/// Main error type for the Wayfarer library
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    /// Operation is not valid in the current session state
    #[error("{0}")]
    Precondition(String),

    #[error("Assertion failed: expected text \"{expected}\" but found \"{actual}\"")]
    AssertionFailed { expected: String, actual: String },

    /// Failure reported by the vendor API
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    pub fn invalid_arguments(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::InvalidArguments {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        AdapterError::Backend {
            status,
            message: message.into(),
        }
    }

    /// True for startup configuration failures (missing credentials)
    pub fn is_config(&self) -> bool {
        matches!(self, AdapterError::Config(_))
    }
}

impl From<String> for AdapterError {
    fn from(s: String) -> Self {
        AdapterError::Other(s)
    }
}

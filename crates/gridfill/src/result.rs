//! Result and error types for gridfill.

use thiserror::Error;

/// Result type for gridfill operations
pub type GridfillResult<T> = Result<T, GridfillError>;

/// Errors that can occur in gridfill
#[derive(Debug, Error)]
pub enum GridfillError {
    /// Replay was requested with nothing captured
    #[error("No records to replay. Paste table data first")]
    EmptyRecords,

    /// Replay request failed validation
    #[error("Invalid replay request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },

    /// The replay routine could not run in any frame of the target tab
    #[error("Replay could not run on the target page: {message}")]
    InjectionFailed {
        /// Error message
        message: String,
    },

    /// Connection to browser failed
    #[error("Failed to connect to browser: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// No usable tab was found in the browser
    #[error("No matching tab found: {message}")]
    TabNotFound {
        /// Error message
        message: String,
    },

    /// Page script evaluation error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Stored state could not be read back
    #[error("State file {path} is corrupt: {message}")]
    CorruptState {
        /// Path of the state file
        path: String,
        /// Error message
        message: String,
    },

    /// Unknown speed preset name
    #[error("Unknown speed preset '{name}' (expected fastest, fast, normal, slow or slowest)")]
    UnknownPreset {
        /// Name that failed to parse
        name: String,
    },

    /// Unknown append mode name
    #[error("Unknown append mode '{name}' (expected none, newline or custom)")]
    UnknownAppendMode {
        /// Name that failed to parse
        name: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl GridfillError {
    /// Create an invalid request error
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create an injection failure
    #[must_use]
    pub fn injection_failed(message: impl Into<String>) -> Self {
        Self::InjectionFailed {
            message: message.into(),
        }
    }
}

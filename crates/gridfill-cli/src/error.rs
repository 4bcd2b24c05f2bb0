//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// System clipboard could not be read
    #[error("Clipboard unavailable: {message}")]
    Clipboard {
        /// Error message
        message: String,
    },

    /// No frame of the target tab had a focused grid field
    #[error(
        "No active input field.\n\n\
         1. Click the first grid cell you want filled\n\
         2. Check that the caret is blinking in it\n\
         3. Run the command again\n\n\
         The field must have focus when the replay starts."
    )]
    NoAnchor,

    /// Replay needs the browser feature
    #[error("This build has no browser support; rebuild with the `browser` feature")]
    BrowserUnsupported,

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gridfill library error
    #[error("{}", describe(.0))]
    Gridfill(#[from] gridfill::GridfillError),
}

fn describe(err: &gridfill::GridfillError) -> String {
    match err {
        gridfill::GridfillError::InjectionFailed { .. }
        | gridfill::GridfillError::TabNotFound { .. } => {
            format!("{err}\nRun this on the page that shows the grid form.")
        }
        _ => err.to_string(),
    }
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a clipboard error
    #[must_use]
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }
}

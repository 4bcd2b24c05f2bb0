//! Append policy: how replayed text combines with what a field already holds.

use crate::result::{GridfillError, GridfillResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used by [`AppendMode::Custom`] when none is configured
pub const DEFAULT_SEPARATOR: &str = ", ";

/// Append mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendMode {
    /// Replace the field's content
    #[default]
    None,
    /// Existing text, a line break, then the record
    Newline,
    /// Existing text, the configured separator, then the record
    Custom,
}

impl AppendMode {
    /// Wire name of the mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Newline => "newline",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for AppendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppendMode {
    type Err = GridfillError;

    fn from_str(s: &str) -> GridfillResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "newline" => Ok(Self::Newline),
            "custom" => Ok(Self::Custom),
            _ => Err(GridfillError::UnknownAppendMode {
                name: s.to_string(),
            }),
        }
    }
}

/// Append configuration handed to the replayer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendConfig {
    /// Mode (`type` on the wire)
    #[serde(rename = "type")]
    pub mode: AppendMode,
    /// Separator for [`AppendMode::Custom`]
    pub separator: String,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            mode: AppendMode::None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl AppendConfig {
    /// Overwrite mode
    #[must_use]
    pub fn overwrite() -> Self {
        Self::default()
    }

    /// Append after a line break
    #[must_use]
    pub fn newline() -> Self {
        Self {
            mode: AppendMode::Newline,
            ..Self::default()
        }
    }

    /// Append after a custom separator
    #[must_use]
    pub fn custom(separator: impl Into<String>) -> Self {
        Self {
            mode: AppendMode::Custom,
            separator: separator.into(),
        }
    }

    /// Whether the field must be fully selected before writing
    #[must_use]
    pub const fn replaces(&self) -> bool {
        matches!(self.mode, AppendMode::None)
    }

    /// Text to write into a field currently holding `existing`.
    ///
    /// Blank existing content is treated as empty in every mode.
    #[must_use]
    pub fn compose(&self, existing: &str, record: &str) -> String {
        let existing = existing.trim();
        if existing.is_empty() {
            return record.to_string();
        }
        match self.mode {
            AppendMode::None => record.to_string(),
            AppendMode::Newline => format!("{existing}\n{record}"),
            AppendMode::Custom => format!("{existing}{}{record}", self.separator),
        }
    }
}

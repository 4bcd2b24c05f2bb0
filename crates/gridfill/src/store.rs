//! Local persistent state: the captured records and the speed selection.
//!
//! State is a single JSON document. Writes replace the whole document
//! (last write wins); nothing is locked.

use crate::result::{GridfillError, GridfillResult};
use crate::timing::SpeedPreset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Current state document version
pub const STATE_VERSION: u32 = 1;

const fn state_version() -> u32 {
    STATE_VERSION
}

/// Everything that survives between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Document version
    #[serde(default = "state_version")]
    pub version: u32,
    /// Captured records, in paste order
    #[serde(rename = "savedArray", default)]
    pub records: Vec<String>,
    /// Selected speed preset
    #[serde(rename = "speedSetting", default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<SpeedPreset>,
    /// When the records were last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            records: Vec::new(),
            speed: None,
            saved_at: None,
        }
    }
}

impl PersistedState {
    /// Selected preset, `normal` when nothing was chosen yet
    #[must_use]
    pub fn speed_or_default(&self) -> SpeedPreset {
        self.speed.unwrap_or_default()
    }
}

/// Load/save access to [`PersistedState`]
pub trait StateStore {
    /// Read the state; a missing store reads as the default state
    fn load(&self) -> GridfillResult<PersistedState>;

    /// Replace the stored state
    fn save(&self, state: &PersistedState) -> GridfillResult<()>;

    /// Replace the record list
    fn save_records(&self, records: &[String]) -> GridfillResult<()> {
        let mut state = self.load()?;
        state.records = records.to_vec();
        state.saved_at = Some(Utc::now());
        self.save(&state)
    }

    /// Remove the record list, keeping the speed selection
    fn clear_records(&self) -> GridfillResult<()> {
        let mut state = self.load()?;
        state.records.clear();
        state.saved_at = None;
        self.save(&state)
    }

    /// Persist the speed selection
    fn save_speed(&self, preset: SpeedPreset) -> GridfillResult<()> {
        let mut state = self.load()?;
        state.speed = Some(preset);
        self.save(&state)
    }
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> GridfillResult<PersistedState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(PersistedState::default());
        }
        serde_json::from_str(&raw).map_err(|e| GridfillError::CorruptState {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn save(&self, state: &PersistedState) -> GridfillResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), records = state.records.len(), "state saved");
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> GridfillResult<PersistedState> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, state: &PersistedState) -> GridfillResult<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

//! Command handlers behind the user-facing surface.
//!
//! Each method is one user action. All of them go through a [`StateStore`],
//! so the surface itself holds no state between invocations.

use crate::append::AppendConfig;
use crate::capture::{capture, display_text, manual_edit, ClipboardPayload, EditOrigin, RecordList};
use crate::protocol::{ReplayRequest, Stride};
use crate::result::{GridfillError, GridfillResult};
use crate::store::{PersistedState, StateStore};
use crate::timing::SpeedPreset;
use serde::Serialize;
use tracing::info;

/// What the record table shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordView {
    /// Records in order
    pub records: RecordList,
}

impl RecordView {
    /// Number of records
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Record-count indicator
    #[must_use]
    pub fn count_label(&self) -> String {
        match self.count() {
            1 => "1 record".to_string(),
            n => format!("{n} records"),
        }
    }

    /// Rows numbered from 1
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r.as_str()))
    }

    /// Capture region text
    #[must_use]
    pub fn display_text(&self) -> String {
        display_text(&self.records)
    }
}

/// Command handlers over a state store
#[derive(Debug)]
pub struct Panel<S: StateStore> {
    store: S,
}

impl<S: StateStore> Panel<S> {
    /// Panel over `store`
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Everything persisted
    pub fn load(&self) -> GridfillResult<PersistedState> {
        self.store.load()
    }

    /// Capture a clipboard payload, replacing the stored records
    pub fn paste(&self, payload: &ClipboardPayload) -> GridfillResult<RecordView> {
        let records = capture(payload);
        self.store.save_records(&records)?;
        info!(records = records.len(), rich = payload.html.is_some(), "clipboard captured");
        Ok(RecordView { records })
    }

    /// Apply a manual edit of the capture region.
    ///
    /// Returns `None` for edits that came from a paste, which were already
    /// captured by [`Panel::paste`].
    pub fn edit(&self, text: &str, origin: EditOrigin) -> GridfillResult<Option<RecordView>> {
        let Some(records) = manual_edit(text, origin) else {
            return Ok(None);
        };
        self.store.save_records(&records)?;
        info!(records = records.len(), "records edited");
        Ok(Some(RecordView { records }))
    }

    /// Drop every stored record
    pub fn clear(&self) -> GridfillResult<RecordView> {
        self.store.clear_records()?;
        info!("records cleared");
        Ok(RecordView {
            records: Vec::new(),
        })
    }

    /// Persist a speed selection
    pub fn select_speed(&self, preset: SpeedPreset) -> GridfillResult<()> {
        self.store.save_speed(preset)?;
        info!(speed = %preset, "speed selected");
        Ok(())
    }

    /// Current speed selection
    pub fn speed(&self) -> GridfillResult<SpeedPreset> {
        Ok(self.store.load()?.speed_or_default())
    }

    /// Stored records
    pub fn view(&self) -> GridfillResult<RecordView> {
        Ok(RecordView {
            records: self.store.load()?.records,
        })
    }

    /// Build the replay request for the stored records.
    ///
    /// Fails with [`GridfillError::EmptyRecords`] before anything touches a
    /// page when there is nothing to replay.
    pub fn prepare_replay(&self, stride: Stride, append: AppendConfig) -> GridfillResult<ReplayRequest> {
        let state = self.store.load()?;
        if state.records.is_empty() {
            return Err(GridfillError::EmptyRecords);
        }
        let timing = state.speed_or_default().profile();
        let request = ReplayRequest::new(state.records, stride, append, timing);
        request.validate()?;
        Ok(request)
    }
}

//! Gridfill: capture pasted spreadsheet rows, replay them into a web grid form.
//!
//! A user copies a block of rows from a spreadsheet. Gridfill turns the
//! clipboard payload into an ordered record list, stores it, and later
//! writes one record per grid row into a third-party form by simulating the
//! keyboard and mouse events a person would produce.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      GRIDFILL Architecture                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐    ┌────────────┐    ┌────────────┐              │
//! │  │ Clipboard  │    │ Panel      │    │ State      │              │
//! │  │ (capture)  │───►│ commands   │◄──►│ store      │              │
//! │  └────────────┘    └─────┬──────┘    └────────────┘              │
//! │                          │ ReplayRequest                         │
//! │                          ▼                                       │
//! │  ┌────────────┐    ┌────────────┐    ┌────────────┐              │
//! │  │ Frames     │───►│ Form       │───►│ FormDriver │              │
//! │  │ (join_all) │    │ Replayer   │    │ CDP / mock │              │
//! │  └────────────┘    └────────────┘    └────────────┘              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gridfill::{AppendConfig, ClipboardPayload, MemoryStore, Panel, Stride};
//!
//! let panel = Panel::new(MemoryStore::new());
//! let view = panel
//!     .paste(&ClipboardPayload::text("Kim\t92\nLee\t87\n"))
//!     .unwrap();
//! assert_eq!(view.count_label(), "2 records");
//!
//! let request = panel
//!     .prepare_replay(Stride::Fixed, AppendConfig::overwrite())
//!     .unwrap();
//! assert_eq!(request.stride, 2);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod append;
mod capture;
/// Chrome DevTools Protocol driver and its page scripts
pub mod cdp;
mod driver;
mod event;
mod locator;
/// In-memory grid driver for tests and demos
pub mod mock;
mod panel;
mod protocol;
mod replay;
mod resolve;
mod result;
mod store;
mod timing;

pub use append::{AppendConfig, AppendMode, DEFAULT_SEPARATOR};
pub use capture::{
    capture, display_text, manual_edit, normalize_whitespace, split_lines, table_rows,
    visible_text, ClipboardPayload, EditOrigin, RecordList, DISPLAY_SEPARATOR, RECORD_SEPARATOR,
};
#[cfg(feature = "browser")]
pub use cdp::{CdpSession, ChromiumDriver};
pub use driver::{ElementHandle, FormDriver, GridPosition};
pub use event::{double_click_sequence, FieldEvent, KeyEvent, KeyPhase, MouseEvent, MouseKind};
pub use locator::{
    is_text_entry, BoundingBox, FieldLocator, FieldTag, GridSelectors, Point, RowState,
};
pub use mock::MockGrid;
pub use panel::{Panel, RecordView};
pub use protocol::{
    aggregate_frames, replay_frames, ReplayRequest, ReplayResponse, ReplaySummary, Stride,
    DEFAULT_STRIDE, NO_ANCHOR, PROTOCOL_VERSION,
};
pub use replay::{FormReplayer, EDIT_MODE_SETTLE, SCROLL_SETTLE};
pub use resolve::{NamedLocator, ResolutionChain};
pub use result::{GridfillError, GridfillResult};
pub use store::{JsonFileStore, MemoryStore, PersistedState, StateStore, STATE_VERSION};
pub use timing::{SpeedPreset, TimingProfile};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::append::*;
    pub use super::capture::*;
    pub use super::driver::*;
    pub use super::event::*;
    pub use super::locator::*;
    pub use super::panel::*;
    pub use super::protocol::*;
    pub use super::replay::*;
    pub use super::resolve::*;
    pub use super::result::*;
    pub use super::store::*;
    pub use super::timing::*;
}

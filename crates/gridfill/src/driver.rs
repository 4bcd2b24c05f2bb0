//! FormDriver - the page primitives the replayer is written against.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  FormDriver (Abstract Trait)                                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐          ┌─────────────────────┐     │
//! │  │  ChromiumDriver     │          │  MockGrid           │     │
//! │  │  (browser feature)  │          │  (tests)            │     │
//! │  │  one per frame,     │          │  in-memory grid     │     │
//! │  │  evaluated scripts  │          │  with focus + Tab   │     │
//! │  └─────────────────────┘          └─────────────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! One driver instance addresses one frame. Element handles are only
//! meaningful to the driver that produced them.

use crate::event::{FieldEvent, KeyEvent, MouseEvent};
use crate::locator::{is_text_entry, BoundingBox, FieldLocator};
use crate::result::GridfillResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to a DOM element inside one frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Element tag name (upper case)
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }

    /// Whether the element accepts typed text
    #[must_use]
    pub fn is_text_entry(&self) -> bool {
        is_text_entry(&self.tag_name)
    }
}

/// Positional indices of the row and cell enclosing an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    /// Row index, if the element sits in an indexed row
    pub row: Option<usize>,
    /// Cell index, if the element sits in an indexed cell
    pub cell: Option<usize>,
}

/// Page primitives needed to replay records into a grid form
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Short name for log lines
    fn label(&self) -> String;

    /// Find a field with one locator
    async fn locate(&self, locator: FieldLocator) -> GridfillResult<Option<ElementHandle>>;

    /// The document's active element, whatever its kind
    async fn active_element(&self) -> GridfillResult<Option<ElementHandle>>;

    /// Row container at a positional index
    async fn row_at(&self, index: usize) -> GridfillResult<Option<ElementHandle>>;

    /// Cell at a positional index within a row
    async fn cell_at(&self, row: &ElementHandle, index: usize)
        -> GridfillResult<Option<ElementHandle>>;

    /// Editable sub-element of a cell
    async fn editor_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>>;

    /// Edit-mode control of a cell
    async fn control_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>>;

    /// Row and cell indices enclosing an element
    async fn grid_position(&self, element: &ElementHandle) -> GridfillResult<GridPosition>;

    /// Dispatch a synthetic keyboard event
    async fn dispatch_key(&self, target: &ElementHandle, event: &KeyEvent) -> GridfillResult<()>;

    /// Dispatch a synthetic mouse event
    async fn dispatch_mouse(&self, target: &ElementHandle, event: &MouseEvent)
        -> GridfillResult<()>;

    /// Dispatch an input/change/blur notification
    async fn dispatch_field_event(&self, target: &ElementHandle, event: FieldEvent)
        -> GridfillResult<()>;

    /// Viewport bounding box
    async fn bounding_box(&self, element: &ElementHandle) -> GridfillResult<Option<BoundingBox>>;

    /// Scroll an element to the middle of the viewport
    async fn scroll_into_view(&self, element: &ElementHandle) -> GridfillResult<()>;

    /// Give a field focus
    async fn focus(&self, field: &ElementHandle) -> GridfillResult<()>;

    /// Select a field's whole content
    async fn select_all(&self, field: &ElementHandle) -> GridfillResult<()>;

    /// Current value of a field
    async fn value(&self, field: &ElementHandle) -> GridfillResult<String>;

    /// Assign the `value` property directly
    async fn assign_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<()>;

    /// Write through the platform's prototype `value` setter.
    ///
    /// Returns `false` when no such setter exists.
    async fn set_native_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<bool>;
}

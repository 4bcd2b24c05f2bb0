//! Synthetic DOM events dispatched during replay.

use crate::locator::Point;
use serde::{Deserialize, Serialize};

/// Key event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPhase {
    /// `keydown`
    Down,
    /// `keyup`
    Up,
}

/// Keyboard event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    /// Down or up
    pub phase: KeyPhase,
    /// `key` property
    pub key: String,
    /// `code` property
    pub code: String,
    /// Legacy `keyCode`/`which`
    pub key_code: u32,
}

impl KeyEvent {
    /// Tab key-down
    #[must_use]
    pub fn tab_down() -> Self {
        Self::tab(KeyPhase::Down)
    }

    /// Tab key-up
    #[must_use]
    pub fn tab_up() -> Self {
        Self::tab(KeyPhase::Up)
    }

    fn tab(phase: KeyPhase) -> Self {
        Self {
            phase,
            key: "Tab".to_string(),
            code: "Tab".to_string(),
            key_code: 9,
        }
    }

    /// DOM event type
    #[must_use]
    pub const fn dom_type(&self) -> &'static str {
        match self.phase {
            KeyPhase::Down => "keydown",
            KeyPhase::Up => "keyup",
        }
    }

    /// Whether this is a Tab key-down
    #[must_use]
    pub fn is_tab_down(&self) -> bool {
        self.phase == KeyPhase::Down && self.key == "Tab"
    }

    /// Only key-down is cancelable
    #[must_use]
    pub const fn cancelable(&self) -> bool {
        matches!(self.phase, KeyPhase::Down)
    }
}

/// Mouse event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseKind {
    /// `mousedown`
    Down,
    /// `mouseup`
    Up,
    /// `click`
    Click,
    /// `dblclick`
    DoubleClick,
}

impl MouseKind {
    /// DOM event type
    #[must_use]
    pub const fn dom_type(self) -> &'static str {
        match self {
            Self::Down => "mousedown",
            Self::Up => "mouseup",
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
        }
    }
}

/// Mouse event at a viewport position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Event kind
    pub kind: MouseKind,
    /// Client X
    pub x: f32,
    /// Client Y
    pub y: f32,
    /// Click count (`detail`), set on `dblclick` only
    pub detail: Option<u32>,
}

impl MouseEvent {
    /// Mouse event of `kind` at `at`
    #[must_use]
    pub const fn at(kind: MouseKind, at: Point) -> Self {
        Self {
            kind,
            x: at.x,
            y: at.y,
            detail: None,
        }
    }
}

/// Events that force a grid cell into edit mode: two full clicks, then `dblclick`.
#[must_use]
pub fn double_click_sequence(at: Point) -> Vec<MouseEvent> {
    let click = [MouseKind::Down, MouseKind::Up, MouseKind::Click];
    let mut events: Vec<MouseEvent> = click
        .iter()
        .chain(click.iter())
        .map(|&kind| MouseEvent::at(kind, at))
        .collect();
    events.push(MouseEvent {
        detail: Some(2),
        ..MouseEvent::at(MouseKind::DoubleClick, at)
    });
    events
}

/// Notification events fired on a field after its value changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEvent {
    /// `input`
    Input,
    /// `change`
    Change,
    /// `blur`
    Blur,
}

impl FieldEvent {
    /// DOM event type
    #[must_use]
    pub const fn dom_type(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
            Self::Blur => "blur",
        }
    }
}

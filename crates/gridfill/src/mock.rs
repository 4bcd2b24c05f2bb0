//! In-memory grid page for exercising the replayer without a browser.
//!
//! The grid is a rectangle of cells laid out in rows. A cell either holds a
//! text field, or shows its value through an edit control that turns into a
//! textarea on double-click. A Tab key-down moves focus to the next cell in
//! row-major order, like the host grid's keyboard handler does. Every
//! mutation and dispatched event is appended to an event log.

use crate::driver::{ElementHandle, FormDriver, GridPosition};
use crate::event::{FieldEvent, KeyEvent, MouseEvent, MouseKind};
use crate::locator::{BoundingBox, FieldLocator, FieldTag, RowState};
use crate::result::{GridfillError, GridfillResult};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

const CELL_WIDTH: f32 = 120.0;
const ROW_HEIGHT: f32 = 32.0;

/// Something that happened to the page
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    /// Keyboard event dispatched at `target`
    Key {
        /// Element id
        target: String,
        /// Event
        event: KeyEvent,
    },
    /// Mouse event dispatched at `target`
    Mouse {
        /// Element id
        target: String,
        /// Event
        event: MouseEvent,
    },
    /// Field notification dispatched at `target`
    Field {
        /// Element id
        target: String,
        /// Event
        event: FieldEvent,
    },
    /// Field focused
    Focus(String),
    /// Field content selected
    SelectAll(String),
    /// Direct `value` assignment
    Assign {
        /// Element id
        target: String,
        /// Assigned text
        text: String,
    },
    /// Write through the prototype setter
    NativeSet {
        /// Element id
        target: String,
        /// Written text
        text: String,
    },
    /// Element scrolled into view
    Scroll(String),
}

#[derive(Debug, Clone)]
struct MockCell {
    value: String,
    editor: Option<FieldTag>,
    control: bool,
    opens_on_dblclick: bool,
}

impl MockCell {
    const fn field(tag: FieldTag) -> Self {
        Self {
            value: String::new(),
            editor: Some(tag),
            control: true,
            opens_on_dblclick: false,
        }
    }
}

#[derive(Debug, Clone)]
struct MockRow {
    cells: Vec<MockCell>,
    selected: bool,
    editing: bool,
}

#[derive(Debug)]
struct GridState {
    rows: Vec<MockRow>,
    cursor: Option<(usize, usize)>,
    focused: Option<(usize, usize)>,
    native_setter: bool,
    events: Vec<DomEvent>,
}

impl GridState {
    fn cell(&self, pos: (usize, usize)) -> Option<&MockCell> {
        self.rows.get(pos.0).and_then(|row| row.cells.get(pos.1))
    }

    fn cell_mut(&mut self, pos: (usize, usize)) -> Option<&mut MockCell> {
        self.rows.get_mut(pos.0).and_then(|row| row.cells.get_mut(pos.1))
    }

    fn field_handle(&self, pos: (usize, usize)) -> Option<ElementHandle> {
        let tag = self.cell(pos)?.editor?;
        Some(ElementHandle::new(
            format!("field:{}:{}", pos.0, pos.1),
            tag.tag_name(),
        ))
    }

    fn next_position(&self, from: (usize, usize)) -> Option<(usize, usize)> {
        let (row, cell) = from;
        let width = self.rows.get(row)?.cells.len();
        if cell + 1 < width {
            Some((row, cell + 1))
        } else if row + 1 < self.rows.len() {
            Some((row + 1, 0))
        } else {
            None
        }
    }

    fn press_tab(&mut self, target: &str) {
        let from = self.cursor.or_else(|| parse_id(target).and_then(|(_, r, c)| Some((r, c?))));
        self.cursor = from.and_then(|pos| self.next_position(pos));
        self.focused = self
            .cursor
            .filter(|&pos| self.cell(pos).is_some_and(|c| c.editor.is_some()));
    }
}

/// Split `kind:row[:cell]` ids
fn parse_id(id: &str) -> Option<(&str, usize, Option<usize>)> {
    let mut parts = id.split(':');
    let kind = parts.next()?;
    let row = parts.next()?.parse().ok()?;
    let cell = parts.next().map(str::parse).transpose().ok()?;
    Some((kind, row, cell))
}

/// In-memory grid implementing [`FormDriver`]
#[derive(Debug)]
pub struct MockGrid {
    state: Mutex<GridState>,
}

impl MockGrid {
    /// Grid of `rows` x `cols` textarea fields, nothing focused
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        let row = MockRow {
            cells: vec![MockCell::field(FieldTag::TextArea); cols],
            selected: false,
            editing: false,
        };
        Self {
            state: Mutex::new(GridState {
                rows: vec![row; rows],
                cursor: None,
                focused: None,
                native_setter: true,
                events: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn edit(self, f: impl FnOnce(&mut GridState)) -> Self {
        f(&mut self.lock());
        self
    }

    /// Focus the field at `(row, cell)`
    #[must_use]
    pub fn with_focus(self, row: usize, cell: usize) -> Self {
        self.edit(|s| {
            s.cursor = Some((row, cell));
            s.focused = Some((row, cell));
        })
    }

    /// Pre-fill a cell's value
    #[must_use]
    pub fn with_value(self, row: usize, cell: usize, value: &str) -> Self {
        self.edit(|s| {
            if let Some(c) = s.cell_mut((row, cell)) {
                c.value = value.to_string();
            }
        })
    }

    /// Mark a row as selected
    #[must_use]
    pub fn with_selected_row(self, row: usize) -> Self {
        self.edit(|s| {
            if let Some(r) = s.rows.get_mut(row) {
                r.selected = true;
            }
        })
    }

    /// Mark a row as being edited
    #[must_use]
    pub fn with_editing_row(self, row: usize) -> Self {
        self.edit(|s| {
            if let Some(r) = s.rows.get_mut(row) {
                r.editing = true;
            }
        })
    }

    /// Use `<input>` fields everywhere
    #[must_use]
    pub fn with_input_fields(self) -> Self {
        self.edit(|s| {
            for cell in s.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                if cell.editor.is_some() {
                    cell.editor = Some(FieldTag::Input);
                }
            }
        })
    }

    /// Turn a cell into display mode: no field until double-clicked
    #[must_use]
    pub fn with_display_cell(self, row: usize, cell: usize) -> Self {
        self.edit(|s| {
            if let Some(c) = s.cell_mut((row, cell)) {
                c.editor = None;
                c.control = true;
                c.opens_on_dblclick = true;
            }
        })
    }

    /// Turn a cell into one that can never be edited
    #[must_use]
    pub fn with_dead_cell(self, row: usize, cell: usize) -> Self {
        self.edit(|s| {
            if let Some(c) = s.cell_mut((row, cell)) {
                c.editor = None;
                c.control = false;
                c.opens_on_dblclick = false;
            }
        })
    }

    /// Pretend the prototype `value` setter is missing
    #[must_use]
    pub fn without_native_setter(self) -> Self {
        self.edit(|s| s.native_setter = false)
    }

    /// Value held by a cell
    #[must_use]
    pub fn value_at(&self, row: usize, cell: usize) -> String {
        self.lock()
            .cell((row, cell))
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Every value, row by row
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        self.lock()
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.value.clone()).collect())
            .collect()
    }

    /// Position of the focused field
    #[must_use]
    pub fn focused(&self) -> Option<(usize, usize)> {
        self.lock().focused
    }

    /// Event log, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<DomEvent> {
        self.lock().events.clone()
    }

    /// Keyboard events only
    #[must_use]
    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DomEvent::Key { event, .. } => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Mouse events only
    #[must_use]
    pub fn mouse_events(&self) -> Vec<MouseEvent> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                DomEvent::Mouse { event, .. } => Some(*event),
                _ => None,
            })
            .collect()
    }

    fn position(element: &ElementHandle) -> GridfillResult<(usize, usize)> {
        match parse_id(&element.id) {
            Some((_, row, Some(cell))) => Ok((row, cell)),
            _ => Err(GridfillError::page(format!(
                "element {} is not a cell",
                element.id
            ))),
        }
    }
}

#[async_trait]
impl FormDriver for MockGrid {
    fn label(&self) -> String {
        "mock grid".to_string()
    }

    async fn locate(&self, locator: FieldLocator) -> GridfillResult<Option<ElementHandle>> {
        let s = self.lock();
        let found = match locator {
            FieldLocator::ActiveElement => s.focused.and_then(|pos| s.field_handle(pos)),
            FieldLocator::Focused(tag) => s
                .focused
                .filter(|&pos| s.cell(pos).and_then(|c| c.editor) == Some(tag))
                .and_then(|pos| s.field_handle(pos)),
            FieldLocator::InRow(state, tag) => {
                s.rows.iter().enumerate().find_map(|(r, row)| {
                    let in_state = match state {
                        RowState::Selected => row.selected,
                        RowState::Editing => row.editing,
                    };
                    if !in_state {
                        return None;
                    }
                    row.cells
                        .iter()
                        .position(|c| c.editor == Some(tag))
                        .and_then(|c| s.field_handle((r, c)))
                })
            }
        };
        Ok(found)
    }

    async fn active_element(&self) -> GridfillResult<Option<ElementHandle>> {
        let s = self.lock();
        Ok(s.focused.and_then(|pos| s.field_handle(pos)))
    }

    async fn row_at(&self, index: usize) -> GridfillResult<Option<ElementHandle>> {
        let s = self.lock();
        Ok((index < s.rows.len()).then(|| ElementHandle::new(format!("row:{index}"), "DIV")))
    }

    async fn cell_at(
        &self,
        row: &ElementHandle,
        index: usize,
    ) -> GridfillResult<Option<ElementHandle>> {
        let s = self.lock();
        let Some((_, r, _)) = parse_id(&row.id) else {
            return Ok(None);
        };
        Ok(s.cell((r, index))
            .map(|_| ElementHandle::new(format!("cell:{r}:{index}"), "DIV")))
    }

    async fn editor_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
        let pos = Self::position(cell)?;
        let s = self.lock();
        Ok(s.cell(pos)
            .filter(|c| c.editor == Some(FieldTag::TextArea))
            .and_then(|_| s.field_handle(pos)))
    }

    async fn control_in(&self, cell: &ElementHandle) -> GridfillResult<Option<ElementHandle>> {
        let (r, c) = Self::position(cell)?;
        let s = self.lock();
        Ok(s.cell((r, c))
            .filter(|cell| cell.control)
            .map(|_| ElementHandle::new(format!("control:{r}:{c}"), "DIV")))
    }

    async fn grid_position(&self, element: &ElementHandle) -> GridfillResult<GridPosition> {
        Ok(parse_id(&element.id).map_or_else(GridPosition::default, |(_, row, cell)| {
            GridPosition {
                row: Some(row),
                cell,
            }
        }))
    }

    async fn dispatch_key(&self, target: &ElementHandle, event: &KeyEvent) -> GridfillResult<()> {
        let mut s = self.lock();
        s.events.push(DomEvent::Key {
            target: target.id.clone(),
            event: event.clone(),
        });
        if event.is_tab_down() {
            s.press_tab(&target.id);
        }
        Ok(())
    }

    async fn dispatch_mouse(
        &self,
        target: &ElementHandle,
        event: &MouseEvent,
    ) -> GridfillResult<()> {
        let mut s = self.lock();
        s.events.push(DomEvent::Mouse {
            target: target.id.clone(),
            event: *event,
        });
        if event.kind == MouseKind::DoubleClick {
            if let Some(("control", r, Some(c))) = parse_id(&target.id) {
                let opened = s.cell_mut((r, c)).is_some_and(|cell| {
                    if cell.opens_on_dblclick {
                        cell.editor = Some(FieldTag::TextArea);
                    }
                    cell.opens_on_dblclick
                });
                if opened {
                    if let Some(row) = s.rows.get_mut(r) {
                        row.editing = true;
                    }
                }
            }
        }
        Ok(())
    }

    async fn dispatch_field_event(
        &self,
        target: &ElementHandle,
        event: FieldEvent,
    ) -> GridfillResult<()> {
        let mut s = self.lock();
        s.events.push(DomEvent::Field {
            target: target.id.clone(),
            event,
        });
        Ok(())
    }

    async fn bounding_box(&self, element: &ElementHandle) -> GridfillResult<Option<BoundingBox>> {
        Ok(parse_id(&element.id).map(|(_, row, cell)| {
            let y = row as f32 * ROW_HEIGHT;
            match cell {
                Some(c) => BoundingBox::new(c as f32 * CELL_WIDTH, y, CELL_WIDTH, ROW_HEIGHT),
                None => BoundingBox::new(0.0, y, CELL_WIDTH * 4.0, ROW_HEIGHT),
            }
        }))
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> GridfillResult<()> {
        self.lock().events.push(DomEvent::Scroll(element.id.clone()));
        Ok(())
    }

    async fn focus(&self, field: &ElementHandle) -> GridfillResult<()> {
        let pos = Self::position(field)?;
        let mut s = self.lock();
        s.cursor = Some(pos);
        s.focused = Some(pos);
        s.events.push(DomEvent::Focus(field.id.clone()));
        Ok(())
    }

    async fn select_all(&self, field: &ElementHandle) -> GridfillResult<()> {
        self.lock().events.push(DomEvent::SelectAll(field.id.clone()));
        Ok(())
    }

    async fn value(&self, field: &ElementHandle) -> GridfillResult<String> {
        let pos = Self::position(field)?;
        Ok(self.lock().cell(pos).map(|c| c.value.clone()).unwrap_or_default())
    }

    async fn assign_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<()> {
        let pos = Self::position(field)?;
        let mut s = self.lock();
        if let Some(cell) = s.cell_mut(pos) {
            cell.value = text.to_string();
        }
        s.events.push(DomEvent::Assign {
            target: field.id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_native_value(&self, field: &ElementHandle, text: &str) -> GridfillResult<bool> {
        let pos = Self::position(field)?;
        let mut s = self.lock();
        if !s.native_setter {
            return Ok(false);
        }
        if let Some(cell) = s.cell_mut(pos) {
            cell.value = text.to_string();
        }
        s.events.push(DomEvent::NativeSet {
            target: field.id.clone(),
            text: text.to_string(),
        });
        Ok(true)
    }
}

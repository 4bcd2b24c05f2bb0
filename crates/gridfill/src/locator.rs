//! Field locators and the grid vocabulary they are written in.
//!
//! A [`FieldLocator`] names one way of finding a text field on the target
//! page. Drivers either render it to a page query ([`FieldLocator::to_query`])
//! or interpret it directly, as the in-memory grid does.

use crate::result::GridfillResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Element bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Kind of text-entry element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTag {
    /// `<textarea>`
    TextArea,
    /// `<input>`
    Input,
}

impl FieldTag {
    /// Both kinds, textarea first
    pub const ALL: [Self; 2] = [Self::TextArea, Self::Input];

    /// DOM `tagName`
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::TextArea => "TEXTAREA",
            Self::Input => "INPUT",
        }
    }

    /// Lowercase CSS type selector
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::TextArea => "textarea",
            Self::Input => "input",
        }
    }

    /// Parse a DOM `tagName`
    #[must_use]
    pub fn from_tag_name(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag_name().eq_ignore_ascii_case(tag))
    }
}

/// Whether a DOM `tagName` accepts typed text
#[must_use]
pub fn is_text_entry(tag_name: &str) -> bool {
    FieldTag::from_tag_name(tag_name).is_some()
}

/// Grid row state marked by a CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowState {
    /// Row currently selected
    Selected,
    /// Row currently in edit mode
    Editing,
}

/// Class and attribute names used by the target grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSelectors {
    /// Class carried by the grid's text fields
    pub text_class: String,
    /// Class carried by row containers
    pub row_class: String,
    /// Class marking the selected row
    pub selected_class: String,
    /// Class marking the row in edit mode
    pub editing_class: String,
    /// Attribute holding a row's positional index
    pub row_index_attr: String,
    /// Attribute holding a cell's positional index
    pub cell_index_attr: String,
    /// Class of the element that switches a cell into edit mode
    pub control_class: String,
    /// Cell index used by the fallback path; inferred from the anchor when unset
    pub target_cell: Option<usize>,
}

impl Default for GridSelectors {
    fn default() -> Self {
        Self {
            text_class: "cl-text".to_string(),
            row_class: "cl-grid-row".to_string(),
            selected_class: "cl-selected".to_string(),
            editing_class: "cl-editing".to_string(),
            row_index_attr: "data-rowindex".to_string(),
            cell_index_attr: "data-cellindex".to_string(),
            control_class: "cl-control".to_string(),
            target_cell: None,
        }
    }
}

impl GridSelectors {
    /// Parse overrides from YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> GridfillResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read overrides from a YAML file
    pub fn from_yaml_file(path: &Path) -> GridfillResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Class for a row state
    #[must_use]
    pub fn state_class(&self, state: RowState) -> &str {
        match state {
            RowState::Selected => &self.selected_class,
            RowState::Editing => &self.editing_class,
        }
    }

    /// Row container at a positional index
    #[must_use]
    pub fn row_css(&self, index: usize) -> String {
        format!("div[{}=\"{index}\"]", self.row_index_attr)
    }

    /// Cell at a positional index within a row
    #[must_use]
    pub fn cell_css(&self, index: usize) -> String {
        format!("div[{}=\"{index}\"]", self.cell_index_attr)
    }

    /// Editable sub-element of a cell
    #[must_use]
    pub fn editor_css(&self) -> String {
        format!("textarea.{}", self.text_class)
    }

    /// Edit-mode control of a cell
    #[must_use]
    pub fn control_css(&self) -> String {
        format!(".{}", self.control_class)
    }
}

/// One way of finding a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLocator {
    /// The document's active element, when it is a text-entry element
    ActiveElement,
    /// A grid text field that has focus
    Focused(FieldTag),
    /// A grid text field inside a row in the given state
    InRow(RowState, FieldTag),
}

impl FieldLocator {
    /// CSS selector for this locator, `None` for [`FieldLocator::ActiveElement`]
    #[must_use]
    pub fn css(&self, grid: &GridSelectors) -> Option<String> {
        match *self {
            Self::ActiveElement => None,
            Self::Focused(tag) => Some(format!("{}.{}:focus", tag.css(), grid.text_class)),
            Self::InRow(state, tag) => Some(format!(
                ".{}.{} {}.{}",
                grid.row_class,
                grid.state_class(state),
                tag.css(),
                grid.text_class
            )),
        }
    }

    /// JavaScript expression yielding the element or `null`; expects `doc` in scope
    #[must_use]
    pub fn to_query(&self, grid: &GridSelectors) -> String {
        match self.css(grid) {
            Some(css) => format!("doc.querySelector({})", serde_json::Value::String(css)),
            None => "((a) => a && (a.tagName === 'TEXTAREA' || a.tagName === 'INPUT') ? a : null)(doc.activeElement)".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod geometry_tests {
        use super::*;

        #[test]
        fn test_center() {
            let bbox = BoundingBox::new(10.0, 20.0, 100.0, 40.0);
            assert_eq!(bbox.center(), Point::new(60.0, 40.0));
        }
    }

    mod tag_tests {
        use super::*;

        #[test]
        fn test_text_entry_tags() {
            assert!(is_text_entry("TEXTAREA"));
            assert!(is_text_entry("input"));
            assert!(!is_text_entry("DIV"));
            assert!(!is_text_entry("SELECT"));
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_focused_css() {
            let grid = GridSelectors::default();
            assert_eq!(
                FieldLocator::Focused(FieldTag::TextArea).css(&grid).unwrap(),
                "textarea.cl-text:focus"
            );
        }

        #[test]
        fn test_row_state_css() {
            let grid = GridSelectors::default();
            assert_eq!(
                FieldLocator::InRow(RowState::Editing, FieldTag::Input)
                    .css(&grid)
                    .unwrap(),
                ".cl-grid-row.cl-editing input.cl-text"
            );
        }

        #[test]
        fn test_active_element_has_no_css() {
            let grid = GridSelectors::default();
            assert!(FieldLocator::ActiveElement.css(&grid).is_none());
            assert!(FieldLocator::ActiveElement
                .to_query(&grid)
                .contains("doc.activeElement"));
        }

        #[test]
        fn test_query_quotes_selector() {
            let grid = GridSelectors::default();
            let query = FieldLocator::InRow(RowState::Selected, FieldTag::TextArea).to_query(&grid);
            assert_eq!(
                query,
                "doc.querySelector(\".cl-grid-row.cl-selected textarea.cl-text\")"
            );
        }

        #[test]
        fn test_query_escapes_override_as_js_literal() {
            let grid = GridSelectors {
                text_class: "a\u{1b}b\"q".to_string(),
                ..GridSelectors::default()
            };
            let query = FieldLocator::Focused(FieldTag::Input).to_query(&grid);
            assert!(query.contains(r#"a\u001bb\"q"#), "{query}");
            assert!(!query.contains("\\u{"), "{query}");
        }

        #[test]
        fn test_positional_css() {
            let grid = GridSelectors::default();
            assert_eq!(grid.row_css(3), "div[data-rowindex=\"3\"]");
            assert_eq!(grid.cell_css(0), "div[data-cellindex=\"0\"]");
            assert_eq!(grid.editor_css(), "textarea.cl-text");
            assert_eq!(grid.control_css(), ".cl-control");
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_override_keeps_defaults() {
            let grid = GridSelectors::from_yaml_str("text_class: my-text\ntarget_cell: 4\n").unwrap();
            assert_eq!(grid.text_class, "my-text");
            assert_eq!(grid.target_cell, Some(4));
            assert_eq!(grid.row_class, "cl-grid-row");
        }

        #[test]
        fn test_invalid_yaml_is_error() {
            assert!(GridSelectors::from_yaml_str("target_cell: [1, 2").is_err());
        }
    }
}

//! Ordered field resolution strategies.
//!
//! A chain is tried front to back; the first locator that yields a
//! text-entry element wins.

use crate::driver::{ElementHandle, FormDriver};
use crate::locator::{FieldLocator, FieldTag, RowState};
use crate::result::GridfillResult;
use tracing::debug;

/// A named field locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedLocator {
    /// Name used in log lines
    pub name: &'static str,
    /// How the field is found
    pub locator: FieldLocator,
}

impl NamedLocator {
    const fn new(name: &'static str, locator: FieldLocator) -> Self {
        Self { name, locator }
    }
}

/// Ordered list of strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionChain {
    strategies: Vec<NamedLocator>,
}

impl ResolutionChain {
    /// Chain used to find the field the user left the caret in
    #[must_use]
    pub fn anchor() -> Self {
        Self {
            strategies: vec![
                NamedLocator::new("active-element", FieldLocator::ActiveElement),
                NamedLocator::new("focused-textarea", FieldLocator::Focused(FieldTag::TextArea)),
                NamedLocator::new("focused-input", FieldLocator::Focused(FieldTag::Input)),
                NamedLocator::new(
                    "selected-row-textarea",
                    FieldLocator::InRow(RowState::Selected, FieldTag::TextArea),
                ),
                NamedLocator::new(
                    "selected-row-input",
                    FieldLocator::InRow(RowState::Selected, FieldTag::Input),
                ),
                NamedLocator::new(
                    "editing-row-textarea",
                    FieldLocator::InRow(RowState::Editing, FieldTag::TextArea),
                ),
                NamedLocator::new(
                    "editing-row-input",
                    FieldLocator::InRow(RowState::Editing, FieldTag::Input),
                ),
            ],
        }
    }

    /// Chain used after Tab navigation
    #[must_use]
    pub fn navigation() -> Self {
        Self {
            strategies: vec![
                NamedLocator::new("focused-textarea", FieldLocator::Focused(FieldTag::TextArea)),
                NamedLocator::new("focused-input", FieldLocator::Focused(FieldTag::Input)),
                NamedLocator::new("active-element", FieldLocator::ActiveElement),
            ],
        }
    }

    /// Strategies in order
    #[must_use]
    pub fn strategies(&self) -> &[NamedLocator] {
        &self.strategies
    }

    /// First text-entry element any strategy finds, with the strategy's name
    pub async fn resolve<D: FormDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> GridfillResult<Option<(&'static str, ElementHandle)>> {
        for strategy in &self.strategies {
            let found = driver.locate(strategy.locator).await?;
            if let Some(field) = found.filter(ElementHandle::is_text_entry) {
                debug!(strategy = strategy.name, field = %field.id, "field resolved");
                return Ok(Some((strategy.name, field)));
            }
        }
        Ok(None)
    }
}

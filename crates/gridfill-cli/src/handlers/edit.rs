//! Edit command handler

use crate::error::CliResult;
use crate::output::ProgressReporter;
use gridfill::{EditOrigin, Panel, RecordView, StateStore};

/// Execute the edit command.
///
/// The text is treated as typed into the capture region, so separator lines
/// and blank lines are dropped before the records are stored.
pub fn execute_edit<S: StateStore>(
    panel: &Panel<S>,
    reporter: &ProgressReporter,
    text: &str,
) -> CliResult<RecordView> {
    let view = panel
        .edit(text, EditOrigin::Typed)?
        .unwrap_or_default();
    reporter.success(&format!("Stored {}", view.count_label()));
    reporter.records(&view);
    Ok(view)
}

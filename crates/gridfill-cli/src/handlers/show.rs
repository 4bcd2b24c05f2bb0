//! Show and clear command handlers

use crate::error::CliResult;
use crate::output::ProgressReporter;
use crate::ShowArgs;
use gridfill::{Panel, RecordView, StateStore};

/// How the show command renders records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// Count indicator and numbered table
    Table,
    /// Capture region text, separators included
    Raw,
    /// JSON object with the record list
    Json,
}

impl From<&ShowArgs> for ShowFormat {
    fn from(args: &ShowArgs) -> Self {
        if args.raw {
            Self::Raw
        } else if args.json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

/// Render a record view in the chosen format
pub fn render(view: &RecordView, format: ShowFormat) -> CliResult<Option<String>> {
    Ok(match format {
        ShowFormat::Table => None,
        ShowFormat::Raw => Some(view.display_text()),
        ShowFormat::Json => Some(serde_json::to_string_pretty(view)?),
    })
}

/// Execute the show command
pub fn execute_show<S: StateStore>(
    panel: &Panel<S>,
    reporter: &ProgressReporter,
    args: &ShowArgs,
) -> CliResult<RecordView> {
    let view = panel.view()?;
    match render(&view, ShowFormat::from(args))? {
        Some(text) => reporter.plain(&text),
        None => reporter.records(&view),
    }
    Ok(view)
}

/// Execute the clear command
pub fn execute_clear<S: StateStore>(panel: &Panel<S>, reporter: &ProgressReporter) -> CliResult<()> {
    let view = panel.clear()?;
    reporter.success("Records cleared");
    reporter.records(&view);
    Ok(())
}

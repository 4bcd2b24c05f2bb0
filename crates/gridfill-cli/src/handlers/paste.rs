//! Paste command handler

use super::read_all;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::PasteArgs;
use gridfill::{ClipboardPayload, Panel, RecordView, StateStore};
use std::io::Read;

/// Assemble the clipboard payload from the sources named on the command line.
///
/// The plain text comes from `--clipboard`, then `--text`, then `stdin` when
/// the caller passes one (it is `None` for an interactive terminal).
pub fn read_payload(args: &PasteArgs, stdin: Option<impl Read>) -> CliResult<ClipboardPayload> {
    let text = if args.clipboard {
        clipboard_text()?
    } else if let Some(ref path) = args.text {
        std::fs::read_to_string(path)?
    } else if let Some(stdin) = stdin {
        read_all(stdin)?
    } else {
        String::new()
    };

    let mut payload = ClipboardPayload::text(text);
    if let Some(ref path) = args.html {
        payload = payload.with_html(std::fs::read_to_string(path)?);
    }

    if payload.html.is_none() && payload.text.trim().is_empty() && !args.clipboard {
        return Err(CliError::invalid_argument(
            "nothing to paste: give --html, --text, --clipboard or pipe text on stdin",
        ));
    }
    Ok(payload)
}

fn clipboard_text() -> CliResult<String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| CliError::clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| CliError::clipboard(e.to_string()))
}

/// Execute the paste command
pub fn execute_paste<S: StateStore>(
    panel: &Panel<S>,
    reporter: &ProgressReporter,
    payload: &ClipboardPayload,
) -> CliResult<RecordView> {
    let view = panel.paste(payload)?;
    if view.count() == 0 {
        reporter.warning("The paste held no non-blank rows; the stored records are now empty.");
    } else {
        reporter.success(&format!("Captured {}", view.count_label()));
    }
    reporter.records(&view);
    Ok(view)
}

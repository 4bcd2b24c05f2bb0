//! Speed and options command handlers

use crate::error::CliResult;
use crate::output::ProgressReporter;
use crate::SpeedArgs;
use gridfill::{AppendMode, Panel, SpeedPreset, StateStore, DEFAULT_SEPARATOR, DEFAULT_STRIDE};

/// Execute the speed command: select a preset, or show the current one
pub fn execute_speed<S: StateStore>(
    panel: &Panel<S>,
    reporter: &ProgressReporter,
    args: &SpeedArgs,
) -> CliResult<SpeedPreset> {
    if let Some(preset) = args.preset {
        let preset = SpeedPreset::from(preset);
        panel.select_speed(preset)?;
        reporter.success(&format!("Speed set to {preset}"));
        return Ok(preset);
    }

    let preset = panel.speed()?;
    reporter.plain(preset.name());
    Ok(preset)
}

/// Execute the options command: preset table and append modes
pub fn execute_options<S: StateStore>(
    panel: &Panel<S>,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    let selected = panel.speed()?;
    reporter.header("Speed presets (ms)");
    reporter.speed_table(selected);

    reporter.header("Append modes");
    for mode in [AppendMode::None, AppendMode::Newline, AppendMode::Custom] {
        reporter.plain(&format!("  {:<8} {}", mode.as_str(), append_help(mode)));
    }

    reporter.header("Stride");
    reporter.plain(&format!(
        "  {DEFAULT_STRIDE} Tab presses between records unless --stride is given"
    ));
    Ok(())
}

fn append_help(mode: AppendMode) -> String {
    match mode {
        AppendMode::None => "replace the field's content".to_string(),
        AppendMode::Newline => "add the record on a new line".to_string(),
        AppendMode::Custom => format!("add the record after --separator (default {DEFAULT_SEPARATOR:?})"),
    }
}

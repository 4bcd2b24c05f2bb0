//! Config command handler

use super::run::load_selectors;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use crate::ConfigArgs;
use gridfill::{GridSelectors, StateStore};

/// Execute the config command
pub fn execute_config(
    config: &CliConfig,
    reporter: &ProgressReporter,
    args: &ConfigArgs,
) -> CliResult<()> {
    print_current_config(config, reporter)?;

    let selectors = load_selectors(args.selectors.as_deref())?;
    reporter.header("Grid selectors");
    for line in selector_lines(&selectors) {
        reporter.plain(&line);
    }
    Ok(())
}

/// Print the current configuration and what the state file holds
pub fn print_current_config(config: &CliConfig, reporter: &ProgressReporter) -> CliResult<()> {
    let store = gridfill::JsonFileStore::new(config.state_path());
    let state = store.load()?;

    reporter.header("Current configuration");
    reporter.plain(&format!("  Verbosity: {:?}", config.verbosity));
    reporter.plain(&format!("  Color: {:?}", config.color));
    reporter.plain(&format!("  JSON logs: {}", config.log_json));
    reporter.plain(&format!("  State file: {}", config.state_path().display()));
    reporter.plain(&format!("  Stored records: {}", state.records.len()));
    reporter.plain(&format!("  Speed: {}", state.speed_or_default()));
    if let Some(saved_at) = state.saved_at {
        reporter.plain(&format!("  Saved at: {}", saved_at.to_rfc3339()));
    }
    Ok(())
}

/// One `key: value` line per selector setting
#[must_use]
pub fn selector_lines(selectors: &GridSelectors) -> Vec<String> {
    let target = selectors
        .target_cell
        .map_or_else(|| "from the focused field".to_string(), |c| c.to_string());
    vec![
        format!("  text_class: {}", selectors.text_class),
        format!("  row_class: {}", selectors.row_class),
        format!("  selected_class: {}", selectors.selected_class),
        format!("  editing_class: {}", selectors.editing_class),
        format!("  row_index_attr: {}", selectors.row_index_attr),
        format!("  cell_index_attr: {}", selectors.cell_index_attr),
        format!("  control_class: {}", selectors.control_class),
        format!("  target_cell: {target}"),
    ]
}

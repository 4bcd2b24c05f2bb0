//! Command handlers - extracted from main.rs for testability
//!
//! Handlers are generic over [`gridfill::StateStore`] so tests can drive them with a
//! [`gridfill::MemoryStore`] while the binary uses the JSON state file.

pub mod config;
pub mod edit;
pub mod paste;
pub mod run;
pub mod show;
pub mod speed;

use crate::config::CliConfig;
use gridfill::{JsonFileStore, Panel};
use std::io::Read;

/// Panel over the state file chosen by the configuration
#[must_use]
pub fn open_panel(config: &CliConfig) -> Panel<JsonFileStore> {
    Panel::new(JsonFileStore::new(config.state_path()))
}

/// Read all of `reader` as text
pub fn read_all(mut reader: impl Read) -> crate::CliResult<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

// Re-export handlers for convenient access
pub use config::execute_config;
pub use edit::execute_edit;
pub use paste::{execute_paste, read_payload};
pub use run::{build_request, execute_run, load_selectors, replay_into};
pub use show::{execute_clear, execute_show};
pub use speed::{execute_options, execute_speed};


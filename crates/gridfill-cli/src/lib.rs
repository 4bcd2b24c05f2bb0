//! Gridfill CLI Library
//!
//! Command-line surface over the `gridfill` library: capture pasted rows,
//! inspect and edit them, pick a replay speed, and replay the records into a
//! grid form in a running browser.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    AppendArg, Cli, ColorArg, Commands, ConfigArgs, EditArgs, PasteArgs, RunArgs, ShowArgs,
    SpeedArg, SpeedArgs,
};
pub use config::{default_state_path, CliConfig, ColorChoice, Verbosity, APP_DIR, STATE_FILE};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;

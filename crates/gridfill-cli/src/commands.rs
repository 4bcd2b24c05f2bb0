//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use gridfill::{AppendConfig, AppendMode, SpeedPreset, Stride};
use std::path::PathBuf;

/// Gridfill: paste spreadsheet rows, replay them into a web grid form
#[derive(Parser, Debug)]
#[command(name = "gridfill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// State file holding the captured records and speed selection
    #[arg(long, env = "GRIDFILL_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture pasted rows, replacing the stored records
    ///
    /// Rows of an HTML table win over plain text. Without --text or
    /// --clipboard the plain text is read from stdin.
    Paste(PasteArgs),

    /// Replace the records with a hand-edited capture region
    Edit(EditArgs),

    /// Show the stored records
    Show(ShowArgs),

    /// Drop every stored record
    Clear,

    /// Show or select the replay speed
    Speed(SpeedArgs),

    /// Show replay options: speed presets and append modes
    Options,

    /// Replay the records into the focused grid field of a browser tab
    ///
    /// Without --stride every record moves two Tab presses further.
    Run(RunArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the paste command
#[derive(Parser, Debug)]
pub struct PasteArgs {
    /// File holding the clipboard's HTML flavor
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// File holding the clipboard's plain-text flavor
    #[arg(long, conflicts_with = "clipboard")]
    pub text: Option<PathBuf>,

    /// Read the plain text from the system clipboard
    #[arg(long)]
    pub clipboard: bool,
}

/// Arguments for the edit command
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// File with the edited text (stdin when omitted)
    pub file: Option<PathBuf>,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Print the capture region text instead of the numbered table
    #[arg(long, conflicts_with = "json")]
    pub raw: bool,

    /// Print the records as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the speed command
#[derive(Parser, Debug)]
pub struct SpeedArgs {
    /// Preset to select; shows the current one when omitted
    pub preset: Option<SpeedArg>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Tab presses between records (custom trigger)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub stride: Option<u32>,

    /// How records combine with text already in a field
    #[arg(long, default_value = "none")]
    pub append: AppendArg,

    /// Separator for --append custom
    #[arg(long, default_value = gridfill::DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Speed for this run only (the stored selection otherwise)
    #[arg(long)]
    pub speed: Option<SpeedArg>,

    /// DevTools WebSocket URL of a running browser
    #[arg(long, env = "GRIDFILL_CDP")]
    pub cdp: String,

    /// Use the first tab whose URL contains this text
    #[arg(long)]
    pub tab_url: Option<String>,

    /// YAML file overriding the grid's class and attribute names
    #[arg(long)]
    pub selectors: Option<PathBuf>,
}

impl RunArgs {
    /// Stride chosen on the command line
    #[must_use]
    pub fn stride(&self) -> Stride {
        Stride::from(self.stride)
    }

    /// Append configuration chosen on the command line
    #[must_use]
    pub fn append_config(&self) -> AppendConfig {
        AppendConfig {
            mode: self.append.into(),
            separator: self.separator.clone(),
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Also show the grid selectors a run would use with this file
    #[arg(long)]
    pub selectors: Option<PathBuf>,
}

/// Speed preset argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedArg {
    /// Shortest waits
    Fastest,
    /// Short waits
    Fast,
    /// Default waits
    Normal,
    /// Long waits
    Slow,
    /// Longest waits
    Slowest,
}

impl From<SpeedArg> for SpeedPreset {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Fastest => Self::Fastest,
            SpeedArg::Fast => Self::Fast,
            SpeedArg::Normal => Self::Normal,
            SpeedArg::Slow => Self::Slow,
            SpeedArg::Slowest => Self::Slowest,
        }
    }
}

/// Append mode argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppendArg {
    /// Replace the field's content
    #[default]
    None,
    /// Append after a line break
    Newline,
    /// Append after --separator
    Custom,
}

impl From<AppendArg> for AppendMode {
    fn from(arg: AppendArg) -> Self {
        match arg {
            AppendArg::None => Self::None,
            AppendArg::Newline => Self::Newline,
            AppendArg::Custom => Self::Custom,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const WS: &str = "ws://127.0.0.1:9222/devtools/browser/abc";

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_show_command() {
            let cli = Cli::parse_from(["gridfill", "show"]);
            assert!(matches!(cli.command, Commands::Show(_)));
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["gridfill", "clear", "-vv", "--state", "/tmp/s.json"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.state, Some(PathBuf::from("/tmp/s.json")));
            assert!(matches!(cli.command, Commands::Clear));
        }

        #[test]
        fn test_parse_paste_sources() {
            let cli = Cli::parse_from(["gridfill", "paste", "--html", "t.html", "--text", "t.txt"]);
            if let Commands::Paste(args) = cli.command {
                assert_eq!(args.html, Some(PathBuf::from("t.html")));
                assert_eq!(args.text, Some(PathBuf::from("t.txt")));
                assert!(!args.clipboard);
            } else {
                panic!("expected Paste command");
            }
        }

        #[test]
        fn test_text_conflicts_with_clipboard() {
            let result =
                Cli::try_parse_from(["gridfill", "paste", "--text", "t.txt", "--clipboard"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_speed() {
            let cli = Cli::parse_from(["gridfill", "speed", "slowest"]);
            if let Commands::Speed(args) = cli.command {
                assert_eq!(args.preset, Some(SpeedArg::Slowest));
                assert_eq!(SpeedPreset::from(SpeedArg::Slowest), SpeedPreset::Slowest);
            } else {
                panic!("expected Speed command");
            }
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_fixed_stride_by_default() {
            let cli = Cli::parse_from(["gridfill", "run", "--cdp", WS]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.stride(), Stride::Fixed);
                assert_eq!(args.append_config(), AppendConfig::overwrite());
                assert!(args.tab_url.is_none());
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_custom_stride_and_append() {
            let cli = Cli::parse_from([
                "gridfill", "run", "--cdp", WS, "--stride", "4", "--append", "custom",
                "--separator", " / ",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.stride(), Stride::Custom(4));
                assert_eq!(args.append_config(), AppendConfig::custom(" / "));
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_zero_stride_rejected() {
            let result = Cli::try_parse_from(["gridfill", "run", "--cdp", WS, "--stride", "0"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_unknown_append_rejected() {
            let result =
                Cli::try_parse_from(["gridfill", "run", "--cdp", WS, "--append", "prepend"]);
            assert!(result.is_err());
        }
    }
}

//! Gridfill CLI: paste spreadsheet rows, replay them into a web grid form
//!
//! ## Usage
//!
//! ```bash
//! gridfill paste --html rows.html --text rows.txt   # Capture copied rows
//! pbpaste | gridfill paste                          # Plain text from stdin
//! gridfill show                                     # Numbered record table
//! gridfill speed slow                               # Select a replay speed
//! gridfill run --cdp ws://127.0.0.1:9222/devtools/browser/<id>
//! ```

use clap::Parser;
use gridfill::{JsonFileStore, Panel};
use gridfill_cli::{
    handlers::{self, open_panel},
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ProgressReporter, RunArgs,
    Verbosity,
};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_logging(&config);

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let panel = open_panel(&config);

    match cli.command {
        Commands::Paste(args) => {
            let stdin = std::io::stdin();
            let input = (!stdin.is_terminal()).then(|| stdin.lock());
            let payload = handlers::read_payload(&args, input)?;
            handlers::execute_paste(&panel, &reporter, &payload).map(|_| ())
        }
        Commands::Edit(args) => {
            let text = match args.file {
                Some(ref path) => std::fs::read_to_string(path)?,
                None => handlers::read_all(std::io::stdin().lock())?,
            };
            handlers::execute_edit(&panel, &reporter, &text).map(|_| ())
        }
        Commands::Show(args) => handlers::execute_show(&panel, &reporter, &args).map(|_| ()),
        Commands::Clear => handlers::execute_clear(&panel, &reporter),
        Commands::Speed(args) => handlers::execute_speed(&panel, &reporter, &args).map(|_| ()),
        Commands::Options => handlers::execute_options(&panel, &reporter),
        Commands::Run(args) => run_replay(&panel, reporter, &args),
        Commands::Config(args) => handlers::execute_config(&config, &reporter, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    let mut config = CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_json(cli.log_json);
    if let Some(ref state) = cli.state {
        config = config.with_state_path(state);
    }
    config
}

/// Log to stderr; `RUST_LOG` wins over the `-v`/`-q` level
fn init_logging(config: &CliConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    let json = config
        .log_json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text = (!config.log_json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(config.color.should_color())
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .try_init();
}

fn run_replay(
    panel: &Panel<JsonFileStore>,
    mut reporter: ProgressReporter,
    args: &RunArgs,
) -> CliResult<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;

    rt.block_on(handlers::execute_run(panel, &mut reporter, args))
        .map(|_| ())
}

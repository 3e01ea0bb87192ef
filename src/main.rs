//! reqpin CLI entry point.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use reqpin::cli::{self, Cli};
use reqpin::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("reqpin=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reqpin=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("reqpin starting with args: {:?}", cli);

    // Failures are reported through the log only; the exit status stays 0.
    if let Err(e) = cli::run(&Config::from(&cli)) {
        tracing::error!("{}", e);
    }
    ExitCode::SUCCESS
}

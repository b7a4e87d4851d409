//! dtf - update and maintenance command line for the DTF pricing calculator

mod cli;
mod commands;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before the first TLS connection
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let Cli {
        verbose,
        quiet,
        command,
    } = Cli::parse();

    // The replacer runs detached and sets up its own file logging
    if !matches!(command, Commands::Replace(_)) {
        init_tracing(verbose, quiet);
    }

    match command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Check(args) => commands::check::run(args).await,
        Commands::Upgrade(args) => commands::upgrade::run(args).await,
        Commands::Replace(args) => commands::replace::run(args, verbose).await,
    }
}

/// Log level from `-v`/`-q`, overridable with `RUST_LOG`
pub(crate) fn verbosity_filter(verbose: u8, quiet: bool) -> EnvFilter {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_tracing(verbose: u8, quiet: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(verbosity_filter(verbose, quiet))
        .init();
}

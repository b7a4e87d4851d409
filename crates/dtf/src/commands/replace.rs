//! Replace command, run by the detached replacer copy of the binary
//!
//! Nobody watches this process's terminal, so everything is also logged to
//! `<temp>/<prefix>-replacer.log`.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Result};
use dtf_core::{HierarchicalConfigLoader, RuntimeConfig};
use dtf_update::{ReplacementHandoff, ReplacerOptions, ReplacerProcess, SystemProcessControl};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*};

use crate::cli::ReplaceArgs;

pub async fn run(args: ReplaceArgs, verbose: u8) -> Result<()> {
    let loaded = HierarchicalConfigLoader::new().and_then(|l| l.load_runtime_config());
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Replacement runs at least at info level so the log file is useful
    let log_path = init_logging(verbose.max(1), &config.updater.temp_prefix);
    if let Err(e) = &loaded {
        warn!("Using built-in replacer settings: {}", e);
    }

    let handoff = handoff_from_args(args, &config);
    let mut options = ReplacerOptions::from_config(&config);
    match std::env::current_exe() {
        Ok(exe) => options = options.with_replacer_copy(exe),
        Err(e) => warn!("Cannot locate the replacer executable: {}", e),
    }

    let replacer = ReplacerProcess::new(handoff, options, SystemProcessControl);
    let run = replacer.run().await;

    match run.outcome.error() {
        None => Ok(()),
        Some(e) => {
            if run.restored_backup {
                warn!("The previous installation was restored");
            }
            match log_path {
                Some(path) => bail!("replacement failed: {} (see {})", e, path.display()),
                None => bail!("replacement failed: {}", e),
            }
        }
    }
}

fn handoff_from_args(args: ReplaceArgs, config: &RuntimeConfig) -> ReplacementHandoff {
    ReplacementHandoff {
        installation_path: args.install_dir,
        staging_path: args.staging_dir,
        main_process_id: args.pid,
        executable_name: args.exe,
        backup: !args.no_backup && config.replacer.backup_before_mirror,
    }
}

fn log_file_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-replacer.log", prefix))
}

/// Console plus file logging; returns the log file when it could be created
fn init_logging(verbose: u8, prefix: &str) -> Option<PathBuf> {
    let path = log_file_path(prefix);
    let file = File::create(&path).ok();

    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(crate::verbosity_filter(verbose, false))
        .init();

    path.exists().then_some(path)
}

//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// DTF pricing calculator - updates and maintenance
#[derive(Parser, Debug)]
#[command(name = "dtf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Check whether a newer release is available
    Check(CheckArgs),

    /// Download and install the latest release, then restart
    ///
    /// The installation directory is the folder holding the dtf executable.
    /// Files there that the release package does not ship are removed, so
    /// keep dtf in its own directory and never in a shared bin folder.
    Upgrade(UpgradeArgs),

    /// Replace an installation with a staged package (started by `upgrade`)
    #[command(hide = true)]
    Replace(ReplaceArgs),
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output the decision as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Hide the download progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Do not keep a copy of the current installation
    #[arg(long)]
    pub no_backup: bool,
}

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// Installation directory to replace
    #[arg(long)]
    pub install_dir: PathBuf,

    /// Staged package to mirror onto the installation
    #[arg(long)]
    pub staging_dir: PathBuf,

    /// Process that must exit first
    #[arg(long)]
    pub pid: u32,

    /// Executable to relaunch, relative to the installation directory
    #[arg(long)]
    pub exe: String,

    /// Skip the pre-mirror backup
    #[arg(long)]
    pub no_backup: bool,
}

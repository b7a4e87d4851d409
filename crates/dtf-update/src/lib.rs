//! Self-update subsystem for the DTF pricing calculator
//!
//! The flow runs in two processes:
//! - the application checks the release source, downloads the package,
//!   stages it and hands off to a detached replacer, then exits
//! - the replacer waits for the application to exit, mirrors the staged tree
//!   onto the installation, relaunches it and cleans up
//!
//! Nothing in the installation directory is touched until the application
//! process has gone.

pub mod checker;
pub mod coordinator;
pub mod download;
pub mod error;
pub mod handoff;
pub mod mirror;
pub mod process;
pub mod releases;
pub mod replacer;
pub mod stage;
pub mod version;

pub use checker::{UpdateChecker, UpdateDecision};
pub use coordinator::ReplacementCoordinator;
pub use download::{DownloadResult, PackageFetcher};
pub use error::{Result, UpdateError};
pub use handoff::ReplacementHandoff;
pub use mirror::{copy_tree, mirror_tree, MirrorReport};
pub use process::{ProcessControl, SystemProcessControl};
pub use releases::{GitHubReleaseSource, ReleaseAsset, ReleaseInfo, ReleaseSource};
pub use replacer::{ReplacerOptions, ReplacerOutcome, ReplacerProcess, ReplacerRun, ReplacerState};
pub use stage::{PackageStager, StagedPackage};
pub use version::Version;

/// Version of the running build
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

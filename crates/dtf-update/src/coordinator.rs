//! Hand-off from the running application to the replacer process

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};

use dtf_core::types::RuntimeConfig;
use dtf_core::utils::executable_file_name;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};
use crate::handoff::ReplacementHandoff;
use crate::process::{ProcessControl, SystemProcessControl};
use crate::stage::StagedPackage;

/// Starts exactly one replacer and then ends the current process
pub struct ReplacementCoordinator<P = SystemProcessControl> {
    process: P,
    temp_dir: PathBuf,
    prefix: String,
    backup: bool,
}

impl ReplacementCoordinator<SystemProcessControl> {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            process: SystemProcessControl,
            temp_dir: std::env::temp_dir(),
            prefix: config.updater.temp_prefix.clone(),
            backup: config.replacer.backup_before_mirror,
        }
    }
}

impl<P: ProcessControl> ReplacementCoordinator<P> {
    pub fn with_process_control<Q: ProcessControl>(self, process: Q) -> ReplacementCoordinator<Q> {
        ReplacementCoordinator {
            process,
            temp_dir: self.temp_dir,
            prefix: self.prefix,
            backup: self.backup,
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Fixed location of the replacer's executable copy
    pub fn replacer_path(&self) -> PathBuf {
        self.temp_dir
            .join(executable_file_name(&format!("{}-replacer", self.prefix)))
    }

    /// Handoff for the executable this process is running from
    pub fn prepare_handoff(&self, staged: &StagedPackage) -> Result<ReplacementHandoff> {
        let current_exe = std::env::current_exe()
            .map_err(|source| UpdateError::ReplacementSpawn { source })?;
        self.handoff_for(staged, &current_exe)
    }

    /// Handoff replacing the installation that holds `executable`
    pub fn handoff_for(&self, staged: &StagedPackage, executable: &Path) -> Result<ReplacementHandoff> {
        let installation_path = executable
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| spawn_error(format!("{} has no parent directory", executable.display())))?
            .to_path_buf();
        let executable_name = executable
            .file_name()
            .ok_or_else(|| spawn_error(format!("{} has no file name", executable.display())))?
            .to_string_lossy()
            .into_owned();

        ensure_executable_name(executable, staged.executable_name())?;

        Ok(ReplacementHandoff {
            installation_path,
            staging_path: staged.path().to_path_buf(),
            main_process_id: std::process::id(),
            executable_name,
            backup: self.backup,
        })
    }

    /// Copy `executable` out of the installation and start it as the
    /// replacer; returns the replacer's pid
    pub fn spawn_replacer(&self, handoff: &ReplacementHandoff, executable: &Path) -> Result<u32> {
        let replacer = self.replacer_path();
        debug!("Copying {} to {}", executable.display(), replacer.display());
        std::fs::copy(executable, &replacer)
            .map_err(|source| UpdateError::ReplacementSpawn { source })?;

        let pid = self
            .process
            .spawn_detached(&replacer, &handoff.to_args())
            .map_err(|source| UpdateError::ReplacementSpawn { source })?;

        info!(
            "Replacer {} started as pid {}, handing over {}",
            replacer.display(),
            pid,
            handoff.installation_path.display()
        );
        Ok(pid)
    }

    /// Spawn the replacer and exit. Only returns when the spawn failed, in
    /// which case the application keeps running on the current version.
    pub fn initiate_replacement(&self, staged: &StagedPackage) -> Result<Infallible> {
        let current_exe = std::env::current_exe()
            .map_err(|source| UpdateError::ReplacementSpawn { source })?;
        let handoff = self.handoff_for(staged, &current_exe)?;
        self.spawn_replacer(&handoff, &current_exe)?;

        info!("Exiting so the installation can be replaced");
        // Exit now: the OS keeps the running image locked until the process is gone
        std::process::exit(0)
    }
}

fn spawn_error(message: String) -> UpdateError {
    UpdateError::ReplacementSpawn {
        source: io::Error::other(message),
    }
}

/// Refuses when `executable` is not the file a package shipping `expected`
/// would relaunch
pub fn ensure_executable_name(executable: &Path, expected: &str) -> Result<()> {
    let name = executable
        .file_name()
        .ok_or_else(|| spawn_error(format!("{} has no file name", executable.display())))?
        .to_string_lossy();
    if same_file_name(&name, expected) {
        Ok(())
    } else {
        Err(spawn_error(format!(
            "package ships {} but the running executable is {}",
            expected, name
        )))
    }
}

fn same_file_name(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

//! The detached process that swaps the installation for the staged package
//!
//! Runs from a copy of the executable outside the installation directory.
//! The states are walked strictly in order and any failure jumps straight
//! to `Terminal`:
//!
//! ```text
//! AwaitingExit -> Mirroring -> Relaunching -> CleaningUp -> Terminal
//! ```
//!
//! Nothing under the installation directory is modified until the
//! application process is gone.

use std::path::PathBuf;
use std::time::Duration;

use dtf_core::types::{RetryPolicy, RuntimeConfig};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{Result, UpdateError};
use crate::handoff::ReplacementHandoff;
use crate::mirror::{copy_tree, mirror_tree, MirrorReport};
use crate::process::ProcessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerState {
    AwaitingExit,
    Mirroring,
    Relaunching,
    CleaningUp,
    Terminal,
}

#[derive(Debug)]
pub enum ReplacerOutcome {
    Success,
    Failure(UpdateError),
}

impl ReplacerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn error(&self) -> Option<&UpdateError> {
        match self {
            Self::Success => None,
            Self::Failure(e) => Some(e),
        }
    }
}

/// Everything a finished run did
#[derive(Debug)]
pub struct ReplacerRun {
    pub outcome: ReplacerOutcome,
    /// States in the order they were entered, ending with `Terminal`
    pub trace: Vec<ReplacerState>,
    pub mirror_report: Option<MirrorReport>,
    /// Pid of the relaunched application, if the spawn succeeded
    pub relaunched_pid: Option<u32>,
    /// The pre-mirror backup was copied back after a failed mirror
    pub restored_backup: bool,
}

#[derive(Debug, Clone)]
pub struct ReplacerOptions {
    pub exit_wait_timeout: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub mirror_policy: RetryPolicy,
    /// This process's own executable copy, deleted during cleanup
    pub replacer_copy: Option<PathBuf>,
}

impl ReplacerOptions {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            exit_wait_timeout: Duration::from_secs(config.replacer.exit_wait_timeout_secs),
            poll_interval: Duration::from_millis(config.replacer.poll_interval_ms.max(1)),
            settle_delay: Duration::from_millis(config.replacer.settle_delay_ms),
            mirror_policy: config.retry_policy("mirror"),
            replacer_copy: None,
        }
    }

    pub fn with_replacer_copy(mut self, path: impl Into<PathBuf>) -> Self {
        self.replacer_copy = Some(path.into());
        self
    }
}

pub struct ReplacerProcess<P> {
    handoff: ReplacementHandoff,
    options: ReplacerOptions,
    process: P,
}

impl<P: ProcessControl> ReplacerProcess<P> {
    pub fn new(handoff: ReplacementHandoff, options: ReplacerOptions, process: P) -> Self {
        Self {
            handoff,
            options,
            process,
        }
    }

    pub fn handoff(&self) -> &ReplacementHandoff {
        &self.handoff
    }

    /// Drive the state machine to `Terminal`
    pub async fn run(&self) -> ReplacerRun {
        let mut run = ReplacerRun {
            outcome: ReplacerOutcome::Success,
            trace: Vec::new(),
            mirror_report: None,
            relaunched_pid: None,
            restored_backup: false,
        };

        let mut state = ReplacerState::AwaitingExit;
        loop {
            run.trace.push(state);
            debug!("Replacer entering {:?}", state);

            state = match state {
                ReplacerState::AwaitingExit => match self.await_exit().await {
                    Ok(()) => ReplacerState::Mirroring,
                    Err(e) => {
                        run.outcome = ReplacerOutcome::Failure(e);
                        ReplacerState::Terminal
                    }
                },
                ReplacerState::Mirroring => match self.mirror(&mut run).await {
                    Ok(report) => {
                        run.mirror_report = Some(report);
                        ReplacerState::Relaunching
                    }
                    Err(e) => {
                        run.outcome = ReplacerOutcome::Failure(e);
                        ReplacerState::Terminal
                    }
                },
                ReplacerState::Relaunching => {
                    run.relaunched_pid = self.relaunch();
                    ReplacerState::CleaningUp
                }
                ReplacerState::CleaningUp => {
                    self.clean_up().await;
                    ReplacerState::Terminal
                }
                ReplacerState::Terminal => break,
            };
        }

        match &run.outcome {
            ReplacerOutcome::Success => info!(
                "Installation {} updated",
                self.handoff.installation_path.display()
            ),
            ReplacerOutcome::Failure(e) => error!("Update failed: {}", e),
        }

        run
    }

    async fn await_exit(&self) -> Result<()> {
        let pid = self.handoff.main_process_id;
        let started = Instant::now();
        let deadline = started + self.options.exit_wait_timeout;

        info!("Waiting for process {} to exit", pid);
        while self.process.is_running(pid) {
            let now = Instant::now();
            if now >= deadline {
                warn!("Process {} is still running, giving up", pid);
                return Err(UpdateError::MirrorTimeout {
                    pid,
                    waited: now - started,
                });
            }
            tokio::time::sleep(self.options.poll_interval.min(deadline - now)).await;
        }

        debug!(
            "Process {} exited after {:?}, settling for {:?}",
            pid,
            started.elapsed(),
            self.options.settle_delay
        );
        tokio::time::sleep(self.options.settle_delay).await;
        Ok(())
    }

    async fn mirror(&self, run: &mut ReplacerRun) -> Result<MirrorReport> {
        let install = &self.handoff.installation_path;
        let staging = &self.handoff.staging_path;
        let policy = &self.options.mirror_policy;

        let backup = if self.handoff.backup {
            let backup = self.handoff.backup_path();
            info!("Backing up {} to {}", install.display(), backup.display());
            copy_tree(install, &backup, policy).await?;
            Some(backup)
        } else {
            None
        };

        info!("Mirroring {} onto {}", staging.display(), install.display());
        match mirror_tree(staging, install, policy).await {
            Ok(report) => {
                info!(
                    "Mirrored {} files, created {} directories, removed {} entries",
                    report.files_copied, report.dirs_created, report.entries_removed
                );
                Ok(report)
            }
            Err(e) => {
                if let Some(backup) = backup {
                    warn!("Mirror failed, restoring {}", backup.display());
                    match mirror_tree(&backup, install, policy).await {
                        Ok(_) => run.restored_backup = true,
                        Err(restore) => error!("Restoring the backup failed as well: {}", restore),
                    }
                }
                Err(e)
            }
        }
    }

    fn relaunch(&self) -> Option<u32> {
        let program = self.handoff.relaunch_path();
        match self.process.spawn_detached(&program, &[]) {
            Ok(pid) => {
                info!("Relaunched {} as pid {}", program.display(), pid);
                Some(pid)
            }
            Err(e) => {
                error!(
                    "Could not relaunch {}: {}; start it manually",
                    program.display(),
                    e
                );
                None
            }
        }
    }

    async fn clean_up(&self) {
        let staging = &self.handoff.staging_path;
        if let Err(e) = tokio::fs::remove_dir_all(staging).await {
            warn!("Could not remove staging {}: {}", staging.display(), e);
        }

        // Windows refuses while this copy is running; the next update overwrites it
        if let Some(copy) = &self.options.replacer_copy {
            if let Err(e) = tokio::fs::remove_file(copy).await {
                debug!("Leaving replacer copy {}: {}", copy.display(), e);
            }
        }
    }
}

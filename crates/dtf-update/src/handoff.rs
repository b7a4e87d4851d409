//! What the application tells the replacer process
//!
//! The handoff travels as command-line arguments of the replacer; there is
//! no other channel between the two processes.

use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementHandoff {
    /// Directory holding the running executable
    pub installation_path: PathBuf,
    /// Staged package to mirror onto the installation
    pub staging_path: PathBuf,
    /// Process that must exit before anything is replaced
    pub main_process_id: u32,
    /// File name of the executable to relaunch
    pub executable_name: String,
    /// Copy the installation aside before mirroring
    pub backup: bool,
}

impl ReplacementHandoff {
    /// Arguments for `<replacer> replace ...`, parsed back by the CLI
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "replace".into(),
            "--install-dir".into(),
            self.installation_path.clone().into_os_string(),
            "--staging-dir".into(),
            self.staging_path.clone().into_os_string(),
            "--pid".into(),
            self.main_process_id.to_string().into(),
            "--exe".into(),
            self.executable_name.clone().into(),
        ];
        if !self.backup {
            args.push("--no-backup".into());
        }
        args
    }

    /// Executable to start once the installation has been replaced
    pub fn relaunch_path(&self) -> PathBuf {
        self.installation_path.join(&self.executable_name)
    }

    /// Sibling directory receiving the pre-mirror copy
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .installation_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("installation"));
        name.push(".bak");
        self.installation_path.with_file_name(name)
    }
}

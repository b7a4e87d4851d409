//! Shared utility functions for dtf crates

use anyhow::anyhow;
use std::path::PathBuf;

/// Get the user's home directory
///
/// HOME wins over `dirs::home_dir()` so test harnesses and portable installs
/// can redirect the config directory.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Platform-specific executable file name for a binary stem
pub fn executable_file_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", stem)
    } else {
        stem.to_string()
    }
}

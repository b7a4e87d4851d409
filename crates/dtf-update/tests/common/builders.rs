//! Builders for release metadata and replacement handoffs

use std::path::{Path, PathBuf};

use dtf_update::{ReleaseAsset, ReleaseInfo, ReplacementHandoff};
use serde_json::{json, Value};

use super::constants::*;

#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    tag: String,
    assets: Vec<ReleaseAsset>,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            tag: TAG_V1_1_0.to_string(),
            assets: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn asset(mut self, name: &str, download_url: &str) -> Self {
        self.assets.push(ReleaseAsset {
            name: name.to_string(),
            download_url: download_url.to_string(),
        });
        self
    }

    pub fn build(self) -> ReleaseInfo {
        ReleaseInfo {
            tag: self.tag,
            assets: self.assets,
        }
    }

    /// Body of the GitHub "latest release" endpoint
    pub fn to_json(&self) -> Value {
        let assets: Vec<Value> = self
            .assets
            .iter()
            .map(|asset| {
                json!({
                    "name": asset.name,
                    "browser_download_url": asset.download_url,
                    "size": 1024,
                    "content_type": "application/octet-stream",
                })
            })
            .collect();

        json!({
            "tag_name": self.tag,
            "name": format!("DTF {}", self.tag),
            "draft": false,
            "prerelease": false,
            "assets": assets,
        })
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handoff for `installation` and `staging` owned by `pid`
pub fn handoff(installation: &Path, staging: &Path, pid: u32) -> ReplacementHandoff {
    ReplacementHandoff {
        installation_path: installation.to_path_buf(),
        staging_path: staging.to_path_buf(),
        main_process_id: pid,
        executable_name: EXE_NAME.to_string(),
        backup: false,
    }
}

pub fn handoff_with_backup(installation: &Path, staging: &Path, pid: u32) -> ReplacementHandoff {
    ReplacementHandoff {
        backup: true,
        ..handoff(installation, staging, pid)
    }
}

pub fn path_buf(path: &str) -> PathBuf {
    PathBuf::from(path)
}

//! Decides whether a newer release is available

use dtf_core::types::RuntimeConfig;
use serde::Serialize;
use std::cmp::Ordering;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::releases::ReleaseSource;
use crate::version::Version;

/// Result of one update check
///
/// `latest_tag` is empty when the release source could not be reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateDecision {
    pub available: bool,
    pub latest_tag: String,
    pub asset_url: Option<String>,
}

/// Compares the latest release of a repository with the running version
pub struct UpdateChecker<S> {
    source: S,
    owner: String,
    repo: String,
    current_version: String,
    asset_name: String,
}

impl<S: ReleaseSource> UpdateChecker<S> {
    pub fn new(
        source: S,
        owner: impl Into<String>,
        repo: impl Into<String>,
        current_version: impl Into<String>,
        asset_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            owner: owner.into(),
            repo: repo.into(),
            current_version: current_version.into(),
            asset_name: asset_name.into(),
        }
    }

    /// Repository and asset name taken from the runtime config
    pub fn from_config(source: S, config: &RuntimeConfig, current_version: impl Into<String>) -> Self {
        Self::new(
            source,
            &config.github.repo_owner,
            &config.github.repo_name,
            current_version,
            &config.updater.asset_name,
        )
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Never fails: every problem is logged and reported as "no update"
    pub async fn check_for_update(&self) -> UpdateDecision {
        let release = match self
            .source
            .fetch_latest_release(&self.owner, &self.repo)
            .await
        {
            Ok(release) => release,
            Err(e) => {
                warn!("Update check against {}/{} failed: {}", self.owner, self.repo, e);
                return UpdateDecision::default();
            }
        };

        let asset_url = release
            .find_asset(&self.asset_name)
            .map(|asset| asset.download_url.clone());

        let mut decision = UpdateDecision {
            available: false,
            latest_tag: release.tag.clone(),
            asset_url,
        };

        if decision.asset_url.is_none() {
            debug!(
                "Release {} has no asset named {}",
                release.tag, self.asset_name
            );
            return decision;
        }

        let ordering = Version::parse(&release.tag).and_then(|latest| {
            Version::parse(&self.current_version).map(|current| latest.cmp(&current))
        });

        match ordering {
            Ok(Ordering::Greater) => {
                info!(
                    "Update available: {} -> {}",
                    self.current_version, release.tag
                );
                decision.available = true;
            }
            Ok(_) => debug!("Already on latest version {}", self.current_version),
            Err(e) => warn!("Cannot determine update availability: {}", e),
        }

        decision
    }
}

impl<S: ReleaseSource + 'static> UpdateChecker<S> {
    /// Run the check on a tokio task so the caller is never blocked
    pub fn check_in_background(self) -> JoinHandle<UpdateDecision> {
        tokio::spawn(async move { self.check_for_update().await })
    }
}

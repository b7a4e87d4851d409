//! Release metadata sources

use std::future::Future;
use std::time::Duration;

use dtf_core::types::{GitHubConfig, NetworkConfig, RuntimeConfig};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,

    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// The latest published release of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag, e.g. `v1.4.0`
    pub tag: String,
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Asset whose name matches `name` exactly
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Anything that can report the latest release of a repository
///
/// Implementations either return a complete [`ReleaseInfo`] or fail with
/// [`UpdateError::Network`], [`UpdateError::NotFound`] or
/// [`UpdateError::MalformedResponse`].
pub trait ReleaseSource: Send + Sync {
    fn fetch_latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<ReleaseInfo>> + Send;
}

/// Payload of `GET /repos/{owner}/{repo}/releases/latest`
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    assets: Vec<ReleaseAsset>,
}

/// [`ReleaseSource`] backed by the GitHub REST API
pub struct GitHubReleaseSource {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubReleaseSource {
    pub fn new(network: &NetworkConfig, github: &GitHubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()
            .map_err(|e| UpdateError::network(format!("failed to build HTTP client: {}", e)))?;

        let token = std::env::var(&github.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            client,
            api_url: github.api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::new(&config.network, &config.github)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl ReleaseSource for GitHubReleaseSource {
    async fn fetch_latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
        let url = format!("{}/repos/{}/{}/releases/latest", self.api_url, owner, repo);
        debug!("Fetching latest release from {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(UpdateError::NotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
            });
        }
        if !status.is_success() {
            return Err(UpdateError::network(format!(
                "release lookup returned HTTP {}",
                status
            )));
        }

        let body = response.bytes().await?;
        let release: GitHubRelease = serde_json::from_slice(&body)
            .map_err(|e| UpdateError::malformed_response(e.to_string()))?;

        debug!(
            "Latest release {} with {} assets",
            release.tag_name,
            release.assets.len()
        );

        Ok(ReleaseInfo {
            tag: release.tag_name,
            assets: release.assets,
        })
    }
}

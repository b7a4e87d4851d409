//! Package download into the shared temp area
//!
//! The package always lands at the same path (`<temp>/<download-file-name>`),
//! replacing whatever an earlier attempt left there. The body is streamed to
//! disk chunk by chunk and hashed on the way; the file is synced before the
//! result is returned so the stager never reads a half-flushed archive.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dtf_core::retry::{ClosurePredicate, RetryExecutor, TracingObserver};
use dtf_core::types::{RetryPolicy, RuntimeConfig};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub file_path: PathBuf,
    pub file_size: u64,
    /// SHA-256 of the bytes written, reported for diagnostics only
    pub checksum: String,
}

pub struct PackageFetcher {
    client: reqwest::Client,
    download_dir: PathBuf,
    file_name: String,
    show_progress: bool,
    retry_policy: RetryPolicy,
}

impl PackageFetcher {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.network.user_agent)
            .timeout(Duration::from_secs(config.network.download_timeout_secs))
            .build()
            .map_err(|e| UpdateError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            download_dir: std::env::temp_dir(),
            file_name: config.updater.download_file_name.clone(),
            show_progress: false,
            retry_policy: config.retry_policy("download"),
        })
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Where the package is written
    pub fn target_path(&self) -> PathBuf {
        self.download_dir.join(&self.file_name)
    }

    /// Download `url`, retrying network failures under the download policy
    pub async fn download(&self, url: &str) -> Result<DownloadResult> {
        let attempts = AtomicU32::new(0);

        let result = RetryExecutor::new(self.retry_policy.clone())
            .with_predicate(ClosurePredicate::new(UpdateError::is_transient))
            .with_observer(TracingObserver::new("download"))
            .execute(|| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                self.download_once(url, attempt)
            })
            .await;

        match result {
            Ok(download) => {
                info!(
                    "Downloaded {} to {}",
                    human_readable_size(download.file_size),
                    download.file_path.display()
                );
                Ok(download)
            }
            Err(e) => Err(e.into_source().unwrap_or_else(|| {
                UpdateError::network("download retry policy allows no attempts")
            })),
        }
    }

    async fn download_once(&self, url: &str, attempt: u32) -> Result<DownloadResult> {
        let file_path = self.target_path();
        debug!("Downloading {} to {} (attempt {})", url, file_path.display(), attempt);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::network(format!(
                "package download returned HTTP {}",
                status
            )));
        }

        let expected_size = response.content_length();
        let progress = self.progress_bar(expected_size, attempt);

        let mut file = tokio::fs::File::create(&file_path)
            .await
            .map_err(|e| UpdateError::write(&file_path, e))?;

        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::write(&file_path, e))?;
            hasher.update(&chunk);
            written += chunk.len() as u64;

            if let Some(pb) = &progress {
                pb.set_position(written);
            }
        }

        file.flush()
            .await
            .map_err(|e| UpdateError::write(&file_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| UpdateError::write(&file_path, e))?;
        drop(file);

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        if let Some(expected) = expected_size {
            if expected != written {
                return Err(UpdateError::network(format!(
                    "download truncated: expected {} bytes, got {}",
                    expected, written
                )));
            }
        }

        Ok(DownloadResult {
            file_path,
            file_size: written,
            checksum: format!("{:x}", hasher.finalize()),
        })
    }

    fn progress_bar(&self, total: Option<u64>, attempt: u32) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = match total {
            Some(total) => {
                let pb = ProgressBar::new(total);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
                )
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                pb.set_style(style);
                pb
            }
            None => ProgressBar::new_spinner(),
        };

        if attempt > 1 {
            pb.set_message(format!("(attempt {})", attempt));
        }
        Some(pb)
    }
}

/// SHA-256 of a file on disk, lowercase hex
pub fn calculate_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(512), "512.00 B");
        assert_eq!(human_readable_size(1536), "1.50 KB");
        assert_eq!(human_readable_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_checksum_of_known_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"Hello, World!").unwrap();

        assert_eq!(
            calculate_checksum(&path).unwrap(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_target_path_uses_fixed_name() {
        let dir = TempDir::new().unwrap();
        let fetcher = PackageFetcher::new(&RuntimeConfig::default())
            .unwrap()
            .with_download_dir(dir.path());
        assert_eq!(fetcher.target_path(), dir.path().join("dtf-update-package"));
    }
}

//! Make one directory tree an exact copy of another
//!
//! Every file-system mutation is retried under the given policy: freshly
//! exited processes and virus scanners tend to hold short-lived locks on the
//! files being replaced.

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use dtf_core::retry::{ClosurePredicate, RetryExecutor, TracingObserver};
use dtf_core::types::RetryPolicy;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, UpdateError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub files_copied: usize,
    pub dirs_created: usize,
    pub entries_removed: usize,
}

/// Mirror `source` onto `destination`
///
/// Afterwards `destination` holds exactly the entries of `source`: files are
/// copied over, missing directories created and entries with no counterpart
/// in `source` deleted. Where one side has a file and the other a directory
/// the destination entry is removed first.
pub async fn mirror_tree(
    source: &Path,
    destination: &Path,
    policy: &RetryPolicy,
) -> Result<MirrorReport> {
    let mut report = MirrorReport::default();

    if !destination.is_dir() {
        if destination.exists() {
            retry(policy, destination, || tokio::fs::remove_file(destination)).await?;
        }
        retry(policy, destination, || tokio::fs::create_dir_all(destination)).await?;
        report.dirs_created += 1;
    }

    let mut wanted: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_failure(source, e))?;
        let relative = relative_to(source, entry.path())?;
        let target = destination.join(&relative);
        wanted.insert(relative);

        if entry.file_type().is_dir() {
            if target.is_dir() {
                continue;
            }
            if target.exists() {
                retry(policy, &target, || tokio::fs::remove_file(&target)).await?;
                report.entries_removed += 1;
            }
            retry(policy, &target, || tokio::fs::create_dir(&target)).await?;
            report.dirs_created += 1;
        } else {
            if target.is_dir() {
                retry(policy, &target, || tokio::fs::remove_dir_all(&target)).await?;
                report.entries_removed += 1;
            }
            retry(policy, &target, || async {
                tokio::fs::copy(entry.path(), &target).await.map(|_| ())
            })
            .await?;
            report.files_copied += 1;
        }
    }

    // Snapshot the destination before deleting anything from it
    let existing: Vec<(PathBuf, bool)> = WalkDir::new(destination)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(|e| walk_failure(destination, e))?;
            Ok((entry.path().to_path_buf(), entry.file_type().is_dir()))
        })
        .collect::<Result<_>>()?;

    let mut removed_dirs: Vec<PathBuf> = Vec::new();
    for (path, is_dir) in existing {
        if removed_dirs.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        if wanted.contains(&relative_to(destination, &path)?) {
            continue;
        }

        debug!("Removing stale {}", path.display());
        if is_dir {
            retry(policy, &path, || tokio::fs::remove_dir_all(&path)).await?;
            removed_dirs.push(path);
        } else {
            retry(policy, &path, || tokio::fs::remove_file(&path)).await?;
        }
        report.entries_removed += 1;
    }

    Ok(report)
}

/// Copy `source` into a fresh `destination`, replacing anything already there
pub async fn copy_tree(
    source: &Path,
    destination: &Path,
    policy: &RetryPolicy,
) -> Result<MirrorReport> {
    if destination.is_dir() {
        retry(policy, destination, || tokio::fs::remove_dir_all(destination)).await?;
    } else if destination.exists() {
        retry(policy, destination, || tokio::fs::remove_file(destination)).await?;
    }
    mirror_tree(source, destination, policy).await
}

async fn retry<F, Fut>(policy: &RetryPolicy, path: &Path, op: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    RetryExecutor::new(policy.clone())
        .with_predicate(ClosurePredicate::new(|e: &io::Error| {
            e.kind() != io::ErrorKind::NotFound
        }))
        .with_observer(TracingObserver::new("mirror"))
        .execute(op)
        .await
        .map_err(|e| {
            let source = e
                .into_source()
                .unwrap_or_else(|| io::Error::other("mirror retry policy allows no attempts"));
            UpdateError::mirror_failure(path, source)
        })
}

fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| {
            UpdateError::mirror_failure(
                path,
                io::Error::other(format!("not below {}", root.display())),
            )
        })
}

fn walk_failure(root: &Path, err: walkdir::Error) -> UpdateError {
    let path = err.path().unwrap_or(root).to_path_buf();
    UpdateError::mirror_failure(path, err.into())
}

//! Extraction of a downloaded package into a private staging directory

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use dtf_core::types::UpdaterConfig;
use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::error::{Result, UpdateError};

/// An extracted package, ready to be mirrored onto the installation
///
/// The directory is uniquely named and only this value refers to it. It is
/// not removed on drop because ownership passes to the replacer process.
#[derive(Debug)]
pub struct StagedPackage {
    path: PathBuf,
    executable_name: String,
}

impl StagedPackage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn executable_name(&self) -> &str {
        &self.executable_name
    }

    pub fn executable_path(&self) -> PathBuf {
        self.path.join(&self.executable_name)
    }

    /// Remove the staged tree when the update is abandoned
    pub fn discard(self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Could not remove staging {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    fn detect(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".zip") {
            return Ok(Self::Zip);
        }
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Ok(Self::TarGz);
        }

        let mut magic = [0u8; 4];
        let read = File::open(path)
            .and_then(|mut f| f.read(&mut magic))
            .map_err(|e| UpdateError::corrupt_package(format!("cannot read package: {}", e)))?;

        match &magic[..read] {
            [b'P', b'K', 0x03, 0x04] => Ok(Self::Zip),
            [0x1f, 0x8b, ..] => Ok(Self::TarGz),
            _ => Err(UpdateError::corrupt_package(
                "unrecognised archive format (expected zip or tar.gz)",
            )),
        }
    }
}

/// Extracts packages below a temp directory
pub struct PackageStager {
    temp_dir: PathBuf,
    prefix: String,
}

impl PackageStager {
    pub fn new(config: &UpdaterConfig) -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            prefix: config.temp_prefix.clone(),
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Extract on the blocking pool
    pub async fn stage(&self, archive_path: &Path, executable_name: &str) -> Result<StagedPackage> {
        let stager = Self {
            temp_dir: self.temp_dir.clone(),
            prefix: self.prefix.clone(),
        };
        let archive_path = archive_path.to_path_buf();
        let executable_name = executable_name.to_string();

        tokio::task::spawn_blocking(move || stager.stage_blocking(&archive_path, &executable_name))
            .await
            .map_err(|e| UpdateError::corrupt_package(format!("extraction task failed: {}", e)))?
    }

    /// Extract `archive_path` and check `executable_name` sits at the root
    ///
    /// On failure the staging directory is removed and the archive kept; on
    /// success the archive is deleted.
    pub fn stage_blocking(&self, archive_path: &Path, executable_name: &str) -> Result<StagedPackage> {
        let staging = self
            .temp_dir
            .join(format!("{}-staging-{}", self.prefix, uuid::Uuid::new_v4()));

        fs::create_dir_all(&self.temp_dir).map_err(|e| UpdateError::write(&self.temp_dir, e))?;
        fs::create_dir(&staging).map_err(|e| UpdateError::write(&staging, e))?;

        match Self::populate(archive_path, &staging, executable_name) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(archive_path) {
                    debug!("Leaving package {} in place: {}", archive_path.display(), e);
                }
                info!("Staged update in {}", staging.display());
                Ok(StagedPackage {
                    path: staging,
                    executable_name: executable_name.to_string(),
                })
            }
            Err(e) => {
                warn!(
                    "Staging failed, keeping {} for inspection: {}",
                    archive_path.display(),
                    e
                );
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!("Could not remove {}: {}", staging.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    fn populate(archive_path: &Path, staging: &Path, executable_name: &str) -> Result<()> {
        match ArchiveFormat::detect(archive_path)? {
            ArchiveFormat::Zip => extract_zip(archive_path, staging)?,
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, staging)?,
        }

        let executable = staging.join(executable_name);
        if !executable.is_file() {
            return Err(missing_executable(staging, executable_name));
        }

        ensure_executable(&executable)
    }
}

fn missing_executable(staging: &Path, executable_name: &str) -> UpdateError {
    let entries: Vec<PathBuf> = fs::read_dir(staging)
        .map(|dir| dir.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();

    if let [only] = entries.as_slice() {
        if only.is_dir() && only.join(executable_name).is_file() {
            return UpdateError::corrupt_package(format!(
                "package wraps its files in a '{}' folder instead of placing {} at the root",
                only.file_name().unwrap_or_default().to_string_lossy(),
                executable_name
            ));
        }
    }

    UpdateError::corrupt_package(format!("package has no {} at its root", executable_name))
}

/// Relative path of an archive entry, refusing anything that could land
/// outside the staging directory
fn entry_path(name: &Path) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in name.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(UpdateError::corrupt_package(format!(
                    "entry '{}' escapes the package root",
                    name.display()
                )));
            }
        }
    }
    Ok(clean)
}

fn extract_zip(archive_path: &Path, staging: &Path) -> Result<()> {
    let corrupt = |e: zip::result::ZipError| UpdateError::corrupt_package(e.to_string());

    let file = File::open(archive_path).map_err(|e| UpdateError::corrupt_package(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(corrupt)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(corrupt)?;
        let relative = entry_path(Path::new(entry.name()))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = staging.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| UpdateError::write(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::write(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| UpdateError::write(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                UpdateError::corrupt_package(format!("{}: {}", relative.display(), e))
            }
            _ => UpdateError::write(&target, e),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().filter(|mode| mode & 0o777 != 0) {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| UpdateError::write(&target, e))?;
            }
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, staging: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| UpdateError::corrupt_package(e.to_string()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| UpdateError::corrupt_package(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| UpdateError::corrupt_package(e.to_string()))?;
        let name = entry
            .path()
            .map_err(|e| UpdateError::corrupt_package(e.to_string()))?
            .into_owned();
        let relative = entry_path(&name)?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            return Err(UpdateError::corrupt_package(format!(
                "entry '{}' is a link",
                name.display()
            )));
        }

        let target = staging.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::write(parent, e))?;
        }
        entry
            .unpack(&target)
            .map_err(|e| UpdateError::write(&target, e))?;
    }

    Ok(())
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| UpdateError::write(path, e))?;
    let mut perms = metadata.permissions();
    if perms.mode() & 0o111 == 0 {
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(|e| UpdateError::write(path, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> Result<()> {
    Ok(())
}

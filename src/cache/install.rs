//! Download, extract and install a release archive into the cache
//!
//! The archive is unpacked into a staging directory next to the cache.
//! Only once the executable is found there does the staging directory
//! replace the cache, so a failed install leaves the previous one intact.

use super::{find_executable, BinaryCache};
use crate::error::{DdddError, DdddResult};
use crate::http;
use crate::release::ReleaseDescriptor;
use crate::ui::DownloadProgress;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Archive formats the release feed publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Pick the format from a download URL's extension (query/fragment ignored)
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
        if path.ends_with(".zip") {
            Some(Self::Zip)
        } else if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Installs release archives into a `BinaryCache`
#[derive(Debug, Clone)]
pub struct Installer {
    cache: BinaryCache,
    executable_name: String,
    connect_timeout: Duration,
    temp_dir: PathBuf,
}

impl Installer {
    /// Create an installer for a cache and the executable it must contain
    pub fn new(cache: BinaryCache, executable_name: impl Into<String>) -> Self {
        Self {
            cache,
            executable_name: executable_name.into(),
            connect_timeout: Duration::from_secs(30),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Download archives into `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Download `release` and install it, returning the executable path
    pub fn install(
        &self,
        release: &ReleaseDescriptor,
        progress: &DownloadProgress,
    ) -> DdddResult<PathBuf> {
        let kind = ArchiveKind::from_url(&release.download_url)
            .ok_or_else(|| DdddError::UnsupportedArchive(release.download_url.clone()))?;

        // Deleted on drop, whatever happens below
        let mut archive = tempfile::Builder::new()
            .prefix("ddddocr-")
            .suffix(".tmp")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| DdddError::io("creating temporary download file", e))?;

        download(
            &release.download_url,
            archive.as_file_mut(),
            progress,
            self.connect_timeout,
        )?;

        self.install_archive(archive.path(), kind, &release.version)
    }

    /// Install an archive already on disk
    pub fn install_archive(
        &self,
        archive: &Path,
        kind: ArchiveKind,
        version: &str,
    ) -> DdddResult<PathBuf> {
        let target = self.cache.dir();
        let parent = staging_parent(target);
        fs::create_dir_all(&parent)
            .map_err(|e| DdddError::io(format!("creating {}", parent.display()), e))?;

        let staging = tempfile::Builder::new()
            .prefix(".ddddocr-staging-")
            .tempdir_in(&parent)
            .map_err(|e| DdddError::io("creating staging directory", e))?;

        extract(archive, kind, staging.path())?;

        let staged_exe = find_executable(staging.path(), &self.executable_name).ok_or_else(|| {
            DdddError::ExecutableNotFound {
                name: self.executable_name.clone(),
                dir: staging.path().to_path_buf(),
            }
        })?;
        make_executable(&staged_exe);

        replace_dir(staging.path(), target)?;

        let exe = self
            .cache
            .find_executable(&self.executable_name)
            .ok_or_else(|| DdddError::ExecutableNotFound {
                name: self.executable_name.clone(),
                dir: target.to_path_buf(),
            })?;
        make_executable(&exe);
        self.cache.save_version(version);

        info!("Installed {} ({})", exe.display(), version);
        Ok(exe)
    }
}

/// Stream `url` into `dest`, reporting progress. Returns bytes written.
pub fn download(
    url: &str,
    dest: &mut impl Write,
    progress: &DownloadProgress,
    connect_timeout: Duration,
) -> DdddResult<u64> {
    let download_err = |reason: String| DdddError::Download {
        url: url.to_string(),
        reason,
    };

    let agent = http::download_agent(connect_timeout);
    let response = agent
        .get(url)
        .header("User-Agent", http::USER_AGENT)
        .call()
        .map_err(|e| download_err(e.to_string()))?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(download_err(format!("HTTP {status}")));
    }

    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    debug!("Downloading {} ({:?} bytes)", url, total);
    progress.start(total);

    let mut reader = response.into_body().into_reader();
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| download_err(e.to_string()))?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n])
            .map_err(|e| DdddError::io("writing download", e))?;
        written += n as u64;
        progress.advance(n as u64);
    }
    dest.flush().map_err(|e| DdddError::io("writing download", e))?;

    progress.finish(written);
    Ok(written)
}

/// Unpack an archive fully into `dest`
pub fn extract(archive: &Path, kind: ArchiveKind, dest: &Path) -> DdddResult<()> {
    let extract_err = |reason: String| DdddError::Extract {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive)
        .map_err(|e| DdddError::io(format!("opening {}", archive.display()), e))?;

    match kind {
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;
            zip.extract(dest).map_err(|e| extract_err(e.to_string()))
        }
        ArchiveKind::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(file));
            tar.unpack(dest).map_err(|e| extract_err(e.to_string()))
        }
    }
}

/// Set rwxr-xr-x on the executable. Failure is a warning only.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::set_permissions(path, fs::Permissions::from_mode(0o755)) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Could not set executable permission on {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> bool {
    true
}

fn staging_parent(target: &Path) -> PathBuf {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn backup_path(target: &Path) -> PathBuf {
    let mut s = target.as_os_str().to_owned();
    s.push(".old");
    PathBuf::from(s)
}

/// Swap `staging` into `target` via renames, restoring the old tree on failure
fn replace_dir(staging: &Path, target: &Path) -> DdddResult<()> {
    let replace_err = |reason: String| DdddError::CacheReplace {
        path: target.to_path_buf(),
        reason,
    };

    let backup = backup_path(target);
    if backup.exists() {
        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!("Could not remove stale backup {}: {}", backup.display(), e);
        }
    }

    let had_old = target.exists();
    if had_old {
        fs::rename(target, &backup).map_err(|e| replace_err(e.to_string()))?;
    }

    if let Err(e) = fs::rename(staging, target) {
        if had_old {
            if let Err(restore) = fs::rename(&backup, target) {
                warn!(
                    "Could not restore previous cache from {}: {}",
                    backup.display(),
                    restore
                );
            }
        }
        return Err(replace_err(e.to_string()));
    }

    if had_old {
        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!("Could not remove previous cache {}: {}", backup.display(), e);
        }
    }

    debug!("Replaced {}", target.display());
    Ok(())
}

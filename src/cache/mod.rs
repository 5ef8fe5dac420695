//! Local cache of the downloaded ddddocr executable
//!
//! The cache is a single directory holding the extracted release tree plus
//! a `.version` marker with the release tag it came from. It is replaced
//! wholesale on update, so the marker always describes the binary next to it.
//!
//! # Update decision
//!
//! | Executable | Marker | Action |
//! |------------|--------|--------|
//! | missing | - | fresh download |
//! | present | differs from latest / missing | replace |
//! | present | equals latest | use cached |

pub mod install;

pub use install::{ArchiveKind, Installer};

use crate::error::{DdddError, DdddResult};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the version marker file inside the cache directory
pub const VERSION_FILE: &str = ".version";

/// Default cache directory name under the home directory
pub const CACHE_DIR_NAME: &str = ".ddddocr_cache";

/// Environment override for the cache directory
pub const CACHE_DIR_ENV: &str = "DDDDCTL_CACHE_DIR";

/// Log file the spawned service writes to
pub const SERVICE_LOG: &str = "service.log";

/// What the launcher should do with the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePlan {
    /// No executable cached yet
    Fresh,
    /// Cached executable is from a different (or unknown) release
    Update { from: Option<String> },
    /// Cached executable matches the latest release
    UseCached,
}

impl UpdatePlan {
    /// Decide from the cache state and the latest release tag
    pub fn decide(has_executable: bool, cached_version: Option<&str>, latest: &str) -> Self {
        if !has_executable {
            return Self::Fresh;
        }
        match cached_version {
            Some(v) if v == latest => Self::UseCached,
            // An untagged release round-trips as an absent marker
            None if latest.is_empty() => Self::UseCached,
            other => Self::Update {
                from: other.map(str::to_string),
            },
        }
    }

    /// Whether a download is needed
    pub fn needs_download(&self) -> bool {
        !matches!(self, Self::UseCached)
    }
}

/// A cached installation found on disk
#[derive(Debug, Clone)]
pub struct CachedInstallation {
    pub dir: PathBuf,
    pub executable: PathBuf,
    pub version: Option<String>,
}

/// Handle on the cache directory
#[derive(Debug, Clone)]
pub struct BinaryCache {
    dir: PathBuf,
}

impl BinaryCache {
    /// Create a handle for a cache directory (not created on disk)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location: `~/.ddddocr_cache`
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_DIR_NAME)
    }

    /// Cache directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Version marker path
    pub fn version_file(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    /// Service log path
    pub fn log_file(&self) -> PathBuf {
        self.dir.join(SERVICE_LOG)
    }

    /// Ensure the cache directory exists
    pub fn ensure_dir(&self) -> DdddResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DdddError::io(format!("creating {}", self.dir.display()), e))
    }

    /// Read the cached release tag; absent when missing, empty or unreadable
    pub fn cached_version(&self) -> Option<String> {
        let path = self.version_file();
        match fs::read_to_string(&path) {
            Ok(content) => {
                let version = content.trim();
                (!version.is_empty()).then(|| version.to_string())
            }
            Err(e) => {
                debug!("No version marker at {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Record the release tag. Failure only costs a redundant download later.
    pub fn save_version(&self, version: &str) -> bool {
        let path = self.version_file();
        match fs::write(&path, version) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not save version info to {}: {}", path.display(), e);
                false
            }
        }
    }

    /// When the version marker was last written
    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(self.version_file()).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Locate the executable anywhere in the cache tree
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        find_executable(&self.dir, name)
    }

    /// The current installation, if an executable is present
    pub fn installation(&self, name: &str) -> Option<CachedInstallation> {
        let executable = self.find_executable(name)?;
        Some(CachedInstallation {
            dir: self.dir.clone(),
            executable,
            version: self.cached_version(),
        })
    }

    /// Remove the cache directory. Returns false if it did not exist.
    pub fn clear(&self) -> DdddResult<bool> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DdddError::io(
                format!("removing {}", self.dir.display()),
                e,
            )),
        }
    }
}

/// Walk `root` and return the first file named exactly `name`.
///
/// Entries are visited in sorted order so the result is stable.
pub fn find_executable(root: &Path, name: &str) -> Option<PathBuf> {
    let mut entries: Vec<_> = fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|f| f == name) {
            return Some(path);
        }
    }

    subdirs.iter().find_map(|dir| find_executable(dir, name))
}

/// SHA-256 of a file, hex encoded
pub fn sha256_file(path: &Path) -> DdddResult<String> {
    let mut file = fs::File::open(path)
        .map_err(|e| DdddError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| DdddError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

//! Storage configuration and path management for Shootclock.
//!
//! All file paths are decided here so hosts and tests can redirect the whole
//! data directory at once.
//!
//! - **Single source of truth**: All path decisions centralized here
//! - **Testable**: `StorageConfig::with_root()` enables test injection
//! - **Overridable**: `SHOOTCLOCK_HOME` relocates the root for hosts

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, ShootError};

pub const HOME_ENV: &str = "SHOOTCLOCK_HOME";

/// Central configuration for all Shootclock storage paths.
///
/// Production code uses `StorageConfig::from_env()` which points to
/// `~/.shootclock/` unless `SHOOTCLOCK_HOME` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        if let Ok(root) = env::var(HOME_ENV) {
            if !root.trim().is_empty() {
                return Ok(Self::with_root(PathBuf::from(root)));
            }
        }
        let home = dirs::home_dir().ok_or(ShootError::HomeNotFound)?;
        Ok(Self::with_root(home.join(".shootclock")))
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to config.json (host preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to the SQLite durable store.
    pub fn store_file(&self) -> PathBuf {
        self.root.join("store").join("shootclock.db")
    }

    /// Path to launch-marker.json (abnormal exit detection).
    pub fn launch_marker_file(&self) -> PathBuf {
        self.root.join("launch-marker.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Directory holding glance region documents.
    pub fn glance_dir(&self) -> PathBuf {
        self.root.join("glance")
    }

    /// Directory for rolling log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates the root directory if missing.
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| ShootError::Io {
            context: format!("creating data dir {}", self.root.display()),
            source: e,
        })
    }
}

/// Writes content to a file atomically using temp file + rename.
///
/// The rename is atomic on the same filesystem, so readers in another process
/// see either the old or the new document.
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| ShootError::Io {
        context: format!("creating directory {}", dir.display()),
        source: e,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ShootError::Io {
        context: format!("creating temp file in {}", dir.display()),
        source: e,
    })?;

    tmp.write_all(contents.as_bytes())
        .map_err(|e| ShootError::Io {
            context: format!("writing temp file for {}", path.display()),
            source: e,
        })?;

    tmp.flush().map_err(|e| ShootError::Io {
        context: format!("flushing temp file for {}", path.display()),
        source: e,
    })?;

    tmp.persist(path).map_err(|e| ShootError::Io {
        context: format!("persisting temp file to {}", path.display()),
        source: e.error,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_hang_off_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/data/shoot"));
        assert_eq!(storage.config_file(), PathBuf::from("/data/shoot/config.json"));
        assert_eq!(
            storage.store_file(),
            PathBuf::from("/data/shoot/store/shootclock.db")
        );
        assert_eq!(
            storage.launch_marker_file(),
            PathBuf::from("/data/shoot/launch-marker.json")
        );
        assert_eq!(storage.glance_dir(), PathBuf::from("/data/shoot/glance"));
        assert_eq!(storage.logs_dir(), PathBuf::from("/data/shoot/logs"));
    }

    #[test]
    fn atomic_write_creates_parent_and_replaces() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("nested").join("doc.json");

        atomic_write(&path, "first").expect("first write");
        atomic_write(&path, "second").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second");
    }
}

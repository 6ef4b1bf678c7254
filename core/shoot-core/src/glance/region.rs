//! Key-value regions visible to a second, read-only process.
//!
//! The region is a versionless last-write-wins register from the host's point
//! of view. File-backed regions replace the whole document atomically so a
//! renderer never observes half of a snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs_err as fs;
use shoot_glance_protocol::{RegionDocument, RegionValue};
use tracing::warn;

use crate::error::{Result, ShootError};
use crate::storage::atomic_write;

pub trait SharedRegion: Send + Sync {
    fn get(&self, key: &str) -> Option<RegionValue>;

    fn set(&self, key: &str, value: RegionValue) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Applies several changes as one write. `None` removes the key.
    fn apply(&self, changes: &[(&str, Option<RegionValue>)]) -> Result<()> {
        for (key, value) in changes {
            match value {
                Some(value) => self.set(key, *value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory region
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryRegion {
    entries: RwLock<HashMap<String, RegionValue>>,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedRegion for MemoryRegion {
    fn get(&self, key: &str) -> Option<RegionValue> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .copied()
    }

    fn set(&self, key: &str, value: RegionValue) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }

    fn apply(&self, changes: &[(&str, Option<RegionValue>)]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        for (key, value) in changes {
            match value {
                Some(value) => entries.insert(key.to_string(), *value),
                None => entries.remove(*key),
            };
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed region
// ─────────────────────────────────────────────────────────────────────────────

/// One JSON document per namespace, e.g. `~/.shootclock/glance/group.shootclock.glance.json`.
#[derive(Debug, Clone)]
pub struct FileRegion {
    path: PathBuf,
}

impl FileRegion {
    /// Opens (creating the directory if needed) the region for `namespace`.
    ///
    /// Fails when the directory cannot be created, which callers treat as
    /// "region unavailable on this host".
    pub fn open(dir: &Path, namespace: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| ShootError::Io {
            context: format!("creating glance region dir {}", dir.display()),
            source: e,
        })?;
        Ok(Self {
            path: dir.join(format!("{}.json", namespace)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document. Missing, empty, corrupt or foreign-version
    /// files all read as an empty region.
    fn load(&self) -> RegionDocument {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return RegionDocument::default()
            }
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Failed to read glance region");
                return RegionDocument::default();
            }
        };

        match RegionDocument::parse(&bytes) {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Ignoring unreadable glance region");
                RegionDocument::default()
            }
        }
    }

    fn store(&self, document: &RegionDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document).map_err(|e| ShootError::Json {
            context: "serializing glance region".to_string(),
            source: e,
        })?;
        atomic_write(&self.path, &content)
    }
}

impl SharedRegion for FileRegion {
    fn get(&self, key: &str) -> Option<RegionValue> {
        self.load().entries.get(key).copied()
    }

    fn set(&self, key: &str, value: RegionValue) -> Result<()> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.apply(&[(key, None)])
    }

    fn apply(&self, changes: &[(&str, Option<RegionValue>)]) -> Result<()> {
        let mut document = self.load();
        for (key, value) in changes {
            match value {
                Some(value) => document.entries.insert(key.to_string(), *value),
                None => document.entries.remove(*key),
            };
        }
        self.store(&document)
    }
}

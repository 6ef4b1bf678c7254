//! Durable key-value store and its bootstrap-with-fallback.
//!
//! The primary store is a SQLite file. When it cannot be opened the bootstrap
//! falls back to an in-memory database so the host still becomes ready, with
//! a warning that nothing will persist. Only when both fail does the
//! bootstrap report a failure (and the arbiter enters safe mode).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::boot::{BootMode, BootstrapResult, Bootstrapper};
use crate::error::{Result, ShootError};

/// Minimal string key-value surface used by the tag catalog.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Arc<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

pub struct Store {
    conn: Mutex<Connection>,
    location: StoreLocation,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ShootError::Io {
                context: format!("creating store dir {}", parent.display()),
                source: e,
            })?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| store_err(format!("opening {}", path.display()), e))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| store_err("enabling WAL", e))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| store_err("setting synchronous", e))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| store_err("setting busy_timeout", e))?;

        Self::with_connection(conn, StoreLocation::File(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| store_err("opening in-memory store", e))?;
        Self::with_connection(conn, StoreLocation::InMemory)
    }

    fn with_connection(conn: Connection, location: StoreLocation) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );",
        )
        .map_err(|e| store_err("creating schema", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.location, StoreLocation::File(_))
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| store_err(format!("reading key {}", key), e))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET \
                    value = excluded.value, \
                    updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| store_err(format!("writing key {}", key), e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| store_err(format!("deleting key {}", key), e))?;
        Ok(())
    }
}

fn store_err(context: impl Into<String>, source: rusqlite::Error) -> ShootError {
    ShootError::Store {
        context: context.into(),
        source,
    }
}

/// Map-backed store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bootstrap
// ─────────────────────────────────────────────────────────────────────────────

/// Opens the primary store, falling back to memory. Blocking.
pub fn open_with_fallback(path: &Path) -> BootstrapResult<Store> {
    let primary_err = match Store::open(path) {
        Ok(store) => {
            info!(path = %path.display(), "Durable store opened");
            return BootstrapResult::Ready {
                store,
                mode: BootMode::Primary,
                warning: None,
            };
        }
        Err(err) => err,
    };

    warn!(error = %primary_err, path = %path.display(), "Primary store unavailable; trying fallback");
    match Store::open_in_memory() {
        Ok(store) => BootstrapResult::Ready {
            store,
            mode: BootMode::Fallback,
            warning: Some(format!(
                "primary store unavailable ({}); changes will not persist",
                primary_err
            )),
        },
        Err(fallback_err) => BootstrapResult::Failed(format!(
            "primary store unavailable ({}); fallback failed ({})",
            primary_err, fallback_err
        )),
    }
}

#[derive(Debug, Clone)]
pub struct StoreBootstrapper {
    path: PathBuf,
}

impl StoreBootstrapper {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Bootstrapper for StoreBootstrapper {
    type Store = Store;

    async fn bootstrap(&self) -> BootstrapResult<Store> {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || open_with_fallback(&path)).await {
            Ok(result) => result,
            Err(err) => BootstrapResult::Failed(format!("store bootstrap task failed: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trips_values() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("store").join("shootclock.db");

        {
            let store = Store::open(&path).expect("open");
            assert!(store.is_persistent());
            assert_eq!(store.get("tags.v1").expect("get"), None);
            store.put("tags.v1", "[]").expect("put");
            store.put("tags.v1", "[1]").expect("overwrite");
        }

        let reopened = Store::open(&path).expect("reopen");
        assert_eq!(reopened.get("tags.v1").expect("get").as_deref(), Some("[1]"));

        reopened.delete("tags.v1").expect("delete");
        assert_eq!(reopened.get("tags.v1").expect("get"), None);
    }

    #[test]
    fn memory_kv_behaves_like_store() {
        let kv = MemoryKv::new();
        kv.put("a", "1").expect("put");
        assert_eq!(kv.get("a").expect("get").as_deref(), Some("1"));
        kv.delete("a").expect("delete");
        assert_eq!(kv.get("a").expect("get"), None);
    }

    #[test]
    fn bootstrap_uses_primary_when_available() {
        let temp = tempdir().expect("temp dir");
        match open_with_fallback(&temp.path().join("shootclock.db")) {
            BootstrapResult::Ready {
                store,
                mode,
                warning,
            } => {
                assert_eq!(mode, BootMode::Primary);
                assert_eq!(warning, None);
                assert!(store.is_persistent());
            }
            BootstrapResult::Failed(err) => panic!("unexpected failure: {}", err),
        }
    }

    #[test]
    fn bootstrap_falls_back_to_memory() {
        let temp = tempdir().expect("temp dir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").expect("write");

        match open_with_fallback(&blocker.join("shootclock.db")) {
            BootstrapResult::Ready {
                store,
                mode,
                warning,
            } => {
                assert_eq!(mode, BootMode::Fallback);
                assert!(warning.expect("warning").contains("will not persist"));
                assert_eq!(*store.location(), StoreLocation::InMemory);
                store.put("k", "v").expect("fallback is writable");
            }
            BootstrapResult::Failed(err) => panic!("unexpected failure: {}", err),
        }
    }

    #[tokio::test]
    async fn async_bootstrap_runs_off_thread() {
        let temp = tempdir().expect("temp dir");
        let bootstrapper = StoreBootstrapper::new(temp.path().join("shootclock.db"));
        match bootstrapper.bootstrap().await {
            BootstrapResult::Ready { mode, .. } => assert_eq!(mode, BootMode::Primary),
            BootstrapResult::Failed(err) => panic!("unexpected failure: {}", err),
        }
    }
}

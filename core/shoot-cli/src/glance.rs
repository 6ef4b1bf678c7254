//! `shootclock glance`: an out-of-process renderer.
//!
//! Reads the region document directly and never writes to it, the same way a
//! widget extension would.

use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use shoot_core::config::ShootConfig;
use shoot_core::storage::StorageConfig;
use shoot_core::types::GlanceSnapshotFfi;
use shoot_glance_protocol::{GlanceLine, PublishedSnapshot, RefreshPolicy, RegionDocument};
use tracing::{debug, warn};

pub fn run(
    storage: &StorageConfig,
    config: &ShootConfig,
    json: bool,
    watch: bool,
) -> Result<(), String> {
    let path = storage
        .glance_dir()
        .join(format!("{}.json", config.glance_namespace));

    loop {
        let now = Utc::now();
        let snapshot = read_snapshot(&path, now);
        if json {
            let view = GlanceSnapshotFfi::from_snapshot(&snapshot, now);
            let out = serde_json::to_string(&view)
                .map_err(|e| format!("Failed to serialize glance: {}", e))?;
            println!("{}", out);
        } else {
            println!("{}", GlanceLine::render(&snapshot, now));
        }

        if !watch {
            return Ok(());
        }

        let next = RefreshPolicy::next_refresh(&snapshot, now);
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        debug!(wait_ms = wait.as_millis() as u64, "Waiting for next glance refresh");
        std::thread::sleep(wait);
    }
}

/// Unwritten or unreadable regions render as not running.
fn read_snapshot(path: &Path, now: DateTime<Utc>) -> PublishedSnapshot {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PublishedSnapshot::not_running(now)
        }
        Err(err) => {
            warn!(error = %err, "Failed to read glance region");
            return PublishedSnapshot::not_running(now);
        }
    };

    RegionDocument::parse(&bytes)
        .map_err(|err| warn!(error = %err, "Ignoring unreadable glance region"))
        .ok()
        .and_then(|document| {
            PublishedSnapshot::from_entries(|key| document.entries.get(key).copied(), now)
        })
        .unwrap_or_else(|| PublishedSnapshot::not_running(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoot_glance_protocol::{RegionValue, KEY_IS_RUNNING, KEY_STARTED_AT};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn missing_region_reads_not_running() {
        let temp = tempfile::tempdir().expect("temp dir");
        let snapshot = read_snapshot(&temp.path().join("absent.json"), at(7));
        assert_eq!(snapshot, PublishedSnapshot::not_running(at(7)));
    }

    #[test]
    fn written_region_is_decoded() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("region.json");
        let mut document = RegionDocument::default();
        document
            .entries
            .insert(KEY_IS_RUNNING.to_string(), RegionValue::Bool(true));
        document
            .entries
            .insert(KEY_STARTED_AT.to_string(), RegionValue::instant(at(50)));
        std::fs::write(&path, serde_json::to_vec(&document).expect("json")).expect("write");

        let snapshot = read_snapshot(&path, at(60));
        assert!(snapshot.is_running);
        assert_eq!(snapshot.started_at, Some(at(50)));
    }

    #[test]
    fn garbage_region_reads_not_running() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("region.json");
        std::fs::write(&path, "{{{").expect("write");
        assert!(!read_snapshot(&path, at(1)).is_running);
    }
}

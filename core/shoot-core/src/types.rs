//! FFI-friendly records handed to Swift/Kotlin hosts.
//!
//! Durations become whole seconds and instants become epoch seconds so the
//! generated bindings stay primitive.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shoot_glance_protocol::{to_epoch_seconds, GlanceLine, PublishedSnapshot, RefreshPolicy};

use crate::session::{Stage, TimerReadout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct TimerReadoutFfi {
    pub stage: Stage,
    pub on_duty: bool,
    pub is_running: bool,
    pub total_secs: u64,
    pub current_stage_secs: u64,
    pub total_label: String,
    pub stage_label: String,
}

impl From<TimerReadout> for TimerReadoutFfi {
    fn from(readout: TimerReadout) -> Self {
        Self {
            stage: readout.stage,
            on_duty: readout.on_duty,
            is_running: readout.is_running,
            total_secs: readout.total.as_secs(),
            current_stage_secs: readout.current_stage.as_secs(),
            total_label: readout.total_label,
            stage_label: readout.stage_label,
        }
    }
}

/// What a glance surface shows, with its next redraw time.
#[derive(Debug, Clone, PartialEq, Serialize, uniffi::Record)]
pub struct GlanceSnapshotFfi {
    pub is_running: bool,
    pub started_at: Option<f64>,
    pub last_updated_at: f64,
    pub age_secs: i64,
    pub is_stale: bool,
    pub line: String,
    pub next_refresh_at: f64,
}

impl GlanceSnapshotFfi {
    pub fn from_snapshot(snapshot: &PublishedSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            is_running: snapshot.is_running,
            started_at: snapshot.started_at.map(to_epoch_seconds),
            last_updated_at: to_epoch_seconds(snapshot.last_updated_at),
            age_secs: snapshot.age_secs(now),
            is_stale: snapshot.is_stale(now),
            line: GlanceLine::render(snapshot, now),
            next_refresh_at: to_epoch_seconds(RefreshPolicy::next_refresh(snapshot, now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn readout_converts_to_whole_seconds() {
        let readout = TimerReadout {
            stage: Stage::Selecting,
            on_duty: true,
            is_running: true,
            total: Duration::from_millis(65_900),
            current_stage: Duration::from_secs(5),
            total_label: "01:05".to_string(),
            stage_label: "00:05".to_string(),
        };
        let ffi = TimerReadoutFfi::from(readout);
        assert_eq!(ffi.total_secs, 65);
        assert_eq!(ffi.current_stage_secs, 5);
        assert_eq!(ffi.stage, Stage::Selecting);
    }

    #[test]
    fn glance_snapshot_carries_render_and_refresh() {
        let snapshot = PublishedSnapshot {
            is_running: true,
            started_at: Some(at(100)),
            last_updated_at: at(164),
        };
        let ffi = GlanceSnapshotFfi::from_snapshot(&snapshot, at(165));
        assert_eq!(ffi.started_at, Some(100.0));
        assert_eq!(ffi.age_secs, 1);
        assert!(!ffi.is_stale);
        assert!(ffi.line.contains("01:05"));
        assert_eq!(ffi.next_refresh_at, 166.0);
    }
}

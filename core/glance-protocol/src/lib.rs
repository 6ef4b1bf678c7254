//! Shared snapshot region contract for Shootclock.
//!
//! This crate is shared by the session host (the only writer) and any glance
//! renderer (read-only) so both sides agree on key names, value encoding and
//! the on-disk document shape. The region holds a display hint, never
//! authoritative session state: last write wins and there is no history.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REGION_VERSION: u32 = 1;
pub const DEFAULT_NAMESPACE: &str = "group.shootclock.glance";

pub const KEY_IS_RUNNING: &str = "isRunning";
pub const KEY_STARTED_AT: &str = "startedAt";
pub const KEY_LAST_UPDATED_AT: &str = "lastUpdatedAt";

/// Refresh cadence while a session is running.
pub const RUNNING_REFRESH_SECS: i64 = 1;
/// Fixed redraw interval once the producer has stopped publishing.
pub const IDLE_REFRESH_SECS: i64 = 15 * 60;
/// A running snapshot older than this is shown as stale.
pub const STALE_AFTER_SECS: i64 = 5;

/// A single value stored in the region.
///
/// Instants are encoded as floating point seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionValue {
    Bool(bool),
    Seconds(f64),
}

impl RegionValue {
    pub fn instant(at: DateTime<Utc>) -> Self {
        RegionValue::Seconds(to_epoch_seconds(at))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RegionValue::Bool(value) => Some(*value),
            RegionValue::Seconds(_) => None,
        }
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RegionValue::Seconds(value) => from_epoch_seconds(*value),
            RegionValue::Bool(_) => None,
        }
    }
}

/// On-disk document for file-backed regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDocument {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, RegionValue>,
}

impl Default for RegionDocument {
    fn default() -> Self {
        Self {
            version: REGION_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl RegionDocument {
    /// Parses a region document, rejecting empty input and foreign versions.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err("region document was empty".to_string());
        }
        let document: RegionDocument = serde_json::from_slice(bytes)
            .map_err(|err| format!("region document was not valid JSON: {}", err))?;
        if document.version != REGION_VERSION {
            return Err(format!(
                "unsupported region version {} (expected {})",
                document.version, REGION_VERSION
            ));
        }
        Ok(document)
    }
}

/// The projection of session state that crosses the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub last_updated_at: DateTime<Utc>,
}

impl PublishedSnapshot {
    /// Builds a snapshot at region precision, so reading it back from any
    /// region yields exactly these instants.
    pub fn new(
        is_running: bool,
        started_at: Option<DateTime<Utc>>,
        last_updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_running,
            started_at: started_at.map(to_region_precision),
            last_updated_at: to_region_precision(last_updated_at),
        }
    }

    /// Snapshot reported when the region was never written or is unavailable.
    pub fn not_running(now: DateTime<Utc>) -> Self {
        Self {
            is_running: false,
            started_at: None,
            last_updated_at: now,
        }
    }

    /// Entries to write. `None` means the key must be removed.
    pub fn to_entries(&self) -> [(&'static str, Option<RegionValue>); 3] {
        [
            (KEY_IS_RUNNING, Some(RegionValue::Bool(self.is_running))),
            (KEY_STARTED_AT, self.started_at.map(RegionValue::instant)),
            (
                KEY_LAST_UPDATED_AT,
                Some(RegionValue::instant(self.last_updated_at)),
            ),
        ]
    }

    /// Rebuilds a snapshot from region entries.
    ///
    /// Returns `None` when the running flag was never written. A missing or
    /// malformed last-updated instant falls back to `now`.
    pub fn from_entries(
        lookup: impl Fn(&str) -> Option<RegionValue>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let is_running = lookup(KEY_IS_RUNNING)?.as_bool()?;
        let started_at = lookup(KEY_STARTED_AT).and_then(|value| value.as_instant());
        let last_updated_at = lookup(KEY_LAST_UPDATED_AT)
            .and_then(|value| value.as_instant())
            .unwrap_or(now);
        Some(Self {
            is_running,
            started_at,
            last_updated_at,
        })
    }

    /// Seconds since the last write, clamped at zero.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.last_updated_at)
            .num_seconds()
            .max(0)
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.is_running && self.age_secs(now) > STALE_AFTER_SECS
    }
}

/// When a renderer should ask for its next draw.
pub struct RefreshPolicy;

impl RefreshPolicy {
    pub fn next_refresh(snapshot: &PublishedSnapshot, now: DateTime<Utc>) -> DateTime<Utc> {
        if snapshot.is_running {
            now + Duration::seconds(RUNNING_REFRESH_SECS)
        } else {
            now + Duration::seconds(IDLE_REFRESH_SECS)
        }
    }
}

/// One-line text rendering used by glance surfaces.
pub struct GlanceLine;

impl GlanceLine {
    pub fn render(snapshot: &PublishedSnapshot, now: DateTime<Utc>) -> String {
        let updated = format!("updated {}s ago", snapshot.age_secs(now));
        if !snapshot.is_running {
            return format!("\u{25cb} idle \u{b7} {}", updated);
        }

        let clock = match snapshot.started_at {
            Some(started_at) => {
                let secs = now.signed_duration_since(started_at).num_seconds().max(0);
                format!("{:02}:{:02}", secs / 60, secs % 60)
            }
            None => "--:--".to_string(),
        };
        let line = format!("\u{25cf} {} \u{b7} {}", clock, updated);
        if snapshot.is_stale(now) {
            format!("{} (stale)", line)
        } else {
            line
        }
    }
}

/// Region instants carry whole microseconds.
pub fn to_region_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

pub fn to_epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_micros()) / 1_000_000.0
}

/// Decodes epoch seconds with microsecond precision.
pub fn from_epoch_seconds(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let secs = value.floor();
    let micros = ((value - secs) * 1_000_000.0).round() as u32;
    // Rounding can carry into the next whole second.
    let (secs, micros) = if micros >= 1_000_000 {
        (secs + 1.0, 0)
    } else {
        (secs, micros)
    };
    DateTime::from_timestamp(secs as i64, micros * 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn region_values_use_plain_json() {
        let mut document = RegionDocument::default();
        document
            .entries
            .insert(KEY_IS_RUNNING.to_string(), RegionValue::Bool(true));
        document.entries.insert(
            KEY_STARTED_AT.to_string(),
            RegionValue::instant(at(1_700_000_000)),
        );

        let json = serde_json::to_value(&document).expect("serialize");
        assert_eq!(json["entries"]["isRunning"], serde_json::json!(true));
        assert_eq!(
            json["entries"]["startedAt"],
            serde_json::json!(1_700_000_000.0)
        );
    }

    #[test]
    fn parse_rejects_empty_and_foreign_versions() {
        assert!(RegionDocument::parse(b"  \n").is_err());
        assert!(RegionDocument::parse(br#"{"version": 9, "entries": {}}"#).is_err());
        assert!(RegionDocument::parse(b"{not json").is_err());

        let parsed = RegionDocument::parse(br#"{"version": 1, "entries": {"isRunning": false}}"#)
            .expect("parse");
        assert_eq!(
            parsed.entries.get(KEY_IS_RUNNING),
            Some(&RegionValue::Bool(false))
        );
    }

    #[test]
    fn snapshot_without_running_flag_is_unwritten() {
        let snapshot = PublishedSnapshot::from_entries(|_| None, at(10));
        assert!(snapshot.is_none());
    }

    #[test]
    fn snapshot_rebuilds_from_entries() {
        let written = PublishedSnapshot {
            is_running: true,
            started_at: Some(at(100)),
            last_updated_at: at(165),
        };
        let entries: BTreeMap<_, _> = written
            .to_entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();

        let read = PublishedSnapshot::from_entries(|key| entries.get(key).copied(), at(999))
            .expect("snapshot");
        assert_eq!(read, written);
    }

    #[test]
    fn missing_last_updated_falls_back_to_now() {
        let read = PublishedSnapshot::from_entries(
            |key| (key == KEY_IS_RUNNING).then_some(RegionValue::Bool(false)),
            at(42),
        )
        .expect("snapshot");
        assert_eq!(read.last_updated_at, at(42));
        assert_eq!(read.started_at, None);
    }

    #[test]
    fn epoch_seconds_keep_microseconds() {
        let instant = DateTime::from_timestamp(1_700_000_000, 123_456_000).expect("instant");
        let decoded = from_epoch_seconds(to_epoch_seconds(instant)).expect("decode");
        assert_eq!(decoded, instant);
        assert!(from_epoch_seconds(f64::NAN).is_none());
    }

    #[test]
    fn refresh_policy_slows_down_when_stopped() {
        let now = at(1_000);
        let running = PublishedSnapshot {
            is_running: true,
            started_at: Some(at(900)),
            last_updated_at: now,
        };
        assert_eq!(RefreshPolicy::next_refresh(&running, now), at(1_001));

        let stopped = PublishedSnapshot::not_running(now);
        assert_eq!(
            RefreshPolicy::next_refresh(&stopped, now),
            at(1_000 + IDLE_REFRESH_SECS)
        );
    }

    #[test]
    fn stale_only_applies_while_running() {
        let snapshot = PublishedSnapshot {
            is_running: true,
            started_at: Some(at(0)),
            last_updated_at: at(10),
        };
        assert!(!snapshot.is_stale(at(15)));
        assert!(snapshot.is_stale(at(16)));
        assert!(!PublishedSnapshot::not_running(at(0)).is_stale(at(100)));
    }

    #[test]
    fn glance_line_renders_running_and_idle() {
        let running = PublishedSnapshot {
            is_running: true,
            started_at: Some(at(100)),
            last_updated_at: at(163),
        };
        assert_eq!(
            GlanceLine::render(&running, at(165)),
            "\u{25cf} 01:05 \u{b7} updated 2s ago"
        );
        assert!(GlanceLine::render(&running, at(175)).ends_with("(stale)"));

        let idle = PublishedSnapshot::not_running(at(10));
        assert_eq!(
            GlanceLine::render(&idle, at(12)),
            "\u{25cb} idle \u{b7} updated 2s ago"
        );
    }

    #[test]
    fn glance_line_without_start_shows_placeholder() {
        let running = PublishedSnapshot {
            is_running: true,
            started_at: None,
            last_updated_at: at(5),
        };
        assert!(GlanceLine::render(&running, at(5)).contains("--:--"));
    }

    #[test]
    fn snapshot_new_survives_encoding_exactly() {
        let started = DateTime::from_timestamp(1_700_000_020, 123_456_789).expect("instant");
        let now = DateTime::from_timestamp(1_700_000_025, 987_654_321).expect("instant");
        let written = PublishedSnapshot::new(true, Some(started), now);
        assert_eq!(
            written.last_updated_at,
            DateTime::from_timestamp(1_700_000_025, 987_654_000).expect("instant")
        );

        let entries: BTreeMap<_, _> = written
            .to_entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();
        let read = PublishedSnapshot::from_entries(|key| entries.get(key).copied(), now)
            .expect("snapshot");
        assert_eq!(read, written);
        assert!(read.last_updated_at <= now);
    }
}

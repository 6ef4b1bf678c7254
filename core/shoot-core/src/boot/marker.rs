//! Persisted launch marker used to spot an abnormal previous exit.
//!
//! Every launch overwrites the marker with `clean_exit: false`; a clean
//! shutdown flips it to true. Finding an unclean marker from a different
//! process on the next launch means that run died. This is a diagnostic
//! signal only and never changes how the current run boots.

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MarkerState {
    pid: u32,
    started_at: String,
    clean_exit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub previous_unclean: bool,
    pub previous_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LaunchMarker {
    path: PathBuf,
}

impl LaunchMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_launch(&self) -> LaunchReport {
        self.record_launch_at(Utc::now(), std::process::id())
    }

    pub fn mark_clean_exit(&self) {
        self.mark_clean_exit_for(std::process::id())
    }

    fn record_launch_at(&self, now: DateTime<Utc>, pid: u32) -> LaunchReport {
        let previous = match load_state(&self.path) {
            Ok(previous) => previous,
            Err(err) => {
                warn!(error = %err, "Failed to read launch marker");
                None
            }
        };

        let report = evaluate(previous.as_ref(), pid);
        if report.previous_unclean {
            warn!(
                previous_started_at = ?report.previous_started_at,
                "Previous launch did not exit cleanly"
            );
        }

        let state = MarkerState {
            pid,
            started_at: now.to_rfc3339(),
            clean_exit: false,
        };
        if let Err(err) = save_state(&self.path, &state) {
            warn!(error = %err, "Failed to persist launch marker");
        }

        report
    }

    fn mark_clean_exit_for(&self, pid: u32) {
        let mut state = match load_state(&self.path) {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Failed to read launch marker on exit");
                return;
            }
        };

        if state.pid != pid {
            debug!(marker_pid = state.pid, pid, "Launch marker owned by another process");
            return;
        }

        state.clean_exit = true;
        if let Err(err) = save_state(&self.path, &state) {
            warn!(error = %err, "Failed to record clean exit");
        }
    }
}

/// A retry inside the same process re-records the launch; only a marker left
/// by another process counts as an abnormal exit.
fn evaluate(previous: Option<&MarkerState>, pid: u32) -> LaunchReport {
    match previous {
        Some(state) if !state.clean_exit && state.pid != pid => LaunchReport {
            previous_unclean: true,
            previous_started_at: parse_timestamp(&state.started_at),
        },
        Some(state) => LaunchReport {
            previous_unclean: false,
            previous_started_at: parse_timestamp(&state.started_at),
        },
        None => LaunchReport::default(),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn load_state(path: &Path) -> Result<Option<MarkerState>, String> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(format!("Failed to read launch marker: {}", err)),
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|err| format!("Failed to parse launch marker: {}", err))
}

fn save_state(path: &Path, state: &MarkerState) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create launch marker dir: {}", err))?;
    }

    let payload = serde_json::to_vec_pretty(state)
        .map_err(|err| format!("Failed to serialize launch marker: {}", err))?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload)
        .map_err(|err| format!("Failed to write launch marker: {}", err))?;
    fs::rename(&tmp_path, path)
        .map_err(|err| format!("Failed to commit launch marker: {}", err))?;
    Ok(())
}

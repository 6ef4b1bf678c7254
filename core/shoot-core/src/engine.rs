//! SessionEngine - the entry point for handheld and wrist hosts.
//!
//! The engine wraps a [`SessionController`] behind a mutex so a host can call
//! it from its UI thread and its tick timer alike. It is synchronous; the
//! async startup path lives in [`crate::boot`] and is driven by the host.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use shoot_core::SessionEngine;
//!
//! let engine = SessionEngine::new(None)?;
//! engine.set_on_duty(true);
//! engine.primary_action()?;
//! let readout = engine.tick();
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{load_config, ShootConfig};
use crate::error::{ActionRejection, ShootFfiError};
use crate::glance::{FileRegion, SharedRegion, SharedStatePublisher};
use crate::session::{format_mm_ss, SessionController, Stage};
use crate::storage::StorageConfig;
use crate::types::{GlanceSnapshotFfi, TimerReadoutFfi};

/// Session timing plus glance publishing for one host process.
#[derive(uniffi::Object)]
pub struct SessionEngine {
    storage: StorageConfig,
    config: ShootConfig,
    clock: Arc<dyn Clock>,
    controller: Mutex<SessionController<Arc<dyn Clock>>>,
}

impl SessionEngine {
    /// Creates an engine over a custom storage root and clock.
    ///
    /// Not exposed to FFI; tests use it with a temp dir and a manual clock.
    pub fn with_storage(storage: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        let config = load_config(&storage);
        let publisher = open_publisher(&storage, &config);
        info!(
            root = %storage.root().display(),
            glance = publisher.is_available(),
            "Session engine ready"
        );

        Self {
            controller: Mutex::new(SessionController::new(Arc::clone(&clock), publisher)),
            storage,
            config,
            clock,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn config(&self) -> &ShootConfig {
        &self.config
    }

    fn controller(&self) -> MutexGuard<'_, SessionController<Arc<dyn Clock>>> {
        self.controller.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A missing glance region never blocks the session; publishing is skipped.
fn open_publisher(storage: &StorageConfig, config: &ShootConfig) -> SharedStatePublisher {
    match FileRegion::open(&storage.glance_dir(), &config.glance_namespace) {
        Ok(region) => {
            let region: Arc<dyn SharedRegion> = Arc::new(region);
            SharedStatePublisher::new(Some(region))
        }
        Err(err) => {
            warn!(error = %err, "Glance region unavailable; publishing disabled");
            SharedStatePublisher::unavailable()
        }
    }
}

#[uniffi::export]
impl SessionEngine {
    /// Creates an engine rooted at `root`, or at `~/.shootclock` (honouring
    /// `SHOOTCLOCK_HOME`) when no root is given.
    #[uniffi::constructor]
    pub fn new(root: Option<String>) -> Result<Self, ShootFfiError> {
        let storage = match root {
            Some(root) => StorageConfig::with_root(PathBuf::from(root)),
            None => StorageConfig::from_env()?,
        };
        storage.ensure_root()?;
        Ok(Self::with_storage(storage, Arc::new(SystemClock)))
    }

    /// Returns the data directory as a string.
    pub fn data_dir(&self) -> String {
        self.storage.root().to_string_lossy().to_string()
    }

    /// Host tick cadence in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.config.tick_interval().as_millis() as u64
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session API
    // ─────────────────────────────────────────────────────────────────────────

    /// The single button: Idle → Shooting → Selecting → Ended → Idle.
    pub fn primary_action(&self) -> Result<Stage, ActionRejection> {
        self.controller().primary_action()
    }

    pub fn end_session(&self) -> Result<Stage, ActionRejection> {
        self.controller().end_session()
    }

    /// Turning duty off discards the session in progress.
    pub fn set_on_duty(&self, on_duty: bool) {
        self.controller().set_on_duty(on_duty);
    }

    pub fn is_on_duty(&self) -> bool {
        self.controller().is_on_duty()
    }

    pub fn stage(&self) -> Stage {
        self.controller().stage()
    }

    pub fn tick(&self) -> TimerReadoutFfi {
        self.controller().tick().into()
    }

    pub fn readout(&self) -> TimerReadoutFfi {
        self.controller().readout().into()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Glance API
    // ─────────────────────────────────────────────────────────────────────────

    /// What a glance surface would currently render.
    pub fn glance(&self) -> GlanceSnapshotFfi {
        let snapshot = self.controller().glance();
        GlanceSnapshotFfi::from_snapshot(&snapshot, self.clock.now())
    }
}

/// Formats whole seconds as `MM:SS` for hosts that track time themselves.
#[uniffi::export]
pub fn format_duration_secs(secs: u64) -> String {
    format_mm_ss(std::time::Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use tempfile::tempdir;

    fn engine() -> (SessionEngine, Arc<ManualClock>, tempfile::TempDir) {
        let temp = tempdir().expect("temp dir");
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let engine = SessionEngine::with_storage(storage, clock.clone());
        (engine, clock, temp)
    }

    #[test]
    fn off_duty_rejects_primary_action() {
        let (engine, _clock, _temp) = engine();
        assert_eq!(engine.primary_action(), Err(ActionRejection::NotOnDuty));
        assert_eq!(engine.stage(), Stage::Idle);
    }

    #[test]
    fn full_cycle_through_engine() {
        let (engine, clock, _temp) = engine();
        engine.set_on_duty(true);
        assert_eq!(engine.primary_action(), Ok(Stage::Shooting));

        clock.advance(Duration::seconds(40));
        assert_eq!(
            engine.end_session(),
            Err(ActionRejection::CannotEndWhileShooting)
        );
        assert_eq!(engine.primary_action(), Ok(Stage::Selecting));

        clock.advance(Duration::seconds(25));
        let readout = engine.tick();
        assert_eq!(readout.total_secs, 65);
        assert_eq!(readout.current_stage_secs, 25);
        assert_eq!(readout.total_label, "01:05");

        let glance = engine.glance();
        assert!(glance.is_running);
        assert_eq!(glance.started_at, Some(1_000.0));
        assert_eq!(glance.age_secs, 0);

        assert_eq!(engine.end_session(), Ok(Stage::Ended));
        assert!(!engine.glance().is_running);
    }

    #[test]
    fn glance_region_is_written_under_root() {
        let (engine, _clock, temp) = engine();
        engine.set_on_duty(true);
        engine.primary_action().expect("start");

        let region_file = temp
            .path()
            .join("glance")
            .join(format!("{}.json", engine.config().glance_namespace));
        assert!(region_file.exists());
    }

    #[test]
    fn duty_off_discards_session() {
        let (engine, clock, _temp) = engine();
        engine.set_on_duty(true);
        engine.primary_action().expect("start");
        clock.advance(Duration::seconds(10));

        engine.set_on_duty(false);
        let readout = engine.readout();
        assert_eq!(readout.stage, Stage::Idle);
        assert_eq!(readout.total_secs, 0);
        assert!(!engine.is_on_duty());
    }

    #[test]
    fn format_duration_matches_timer_labels() {
        assert_eq!(format_duration_secs(65), "01:05");
        assert_eq!(format_duration_secs(0), "00:00");
    }
}

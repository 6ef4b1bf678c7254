use std::sync::Arc;

use chrono::{DateTime, Utc};
use shoot_glance_protocol::PublishedSnapshot;
use tracing::{debug, warn};

use super::region::SharedRegion;

/// Single producer for the glance region.
///
/// Writes are fire-and-forget: a failed write is logged and the next publish
/// simply tries again. An absent region (unsupported host configuration)
/// turns every publish into a no-op and every read into the default snapshot.
#[derive(Clone)]
pub struct SharedStatePublisher {
    region: Option<Arc<dyn SharedRegion>>,
}

impl SharedStatePublisher {
    pub fn new(region: Option<Arc<dyn SharedRegion>>) -> Self {
        Self { region }
    }

    pub fn unavailable() -> Self {
        Self { region: None }
    }

    pub fn is_available(&self) -> bool {
        self.region.is_some()
    }

    pub fn publish(&self, is_running: bool, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        let Some(region) = &self.region else {
            debug!(is_running, "Glance region unavailable; skipping publish");
            return;
        };

        let snapshot = PublishedSnapshot::new(is_running, started_at, now);
        if let Err(err) = region.apply(&snapshot.to_entries()) {
            warn!(error = %err, is_running, "Failed to publish glance snapshot");
        }
    }

    pub fn read(&self, now: DateTime<Utc>) -> PublishedSnapshot {
        self.region
            .as_ref()
            .and_then(|region| PublishedSnapshot::from_entries(|key| region.get(key), now))
            .unwrap_or_else(|| PublishedSnapshot::not_running(now))
    }
}

impl std::fmt::Debug for SharedStatePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStatePublisher")
            .field("available", &self.is_available())
            .finish()
    }
}

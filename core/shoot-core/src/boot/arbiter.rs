//! Startup arbitration: durable-store bootstrap raced against a hard timeout.
//!
//! Each `start()` runs one driver task that selects over the bootstrap future
//! and a sleep. Whichever finishes first produces the outcome and the other
//! future is dropped (cancelled). The outcome is committed through a
//! generation-guarded, single-assignment slot, so a driver from an older
//! `start()` or a second resolution can never flip a state the UI has
//! already reacted to.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::marker::LaunchMarker;
use super::outcome::{BootMode, BootOutcome, BootstrapResult, Bootstrapper};

pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
pub const TIMEOUT_MESSAGE: &str = "startup exceeded timeout";
pub const GENERIC_FAILURE_MESSAGE: &str = "startup failed";

#[derive(Default)]
struct Control {
    generation: u64,
    started: bool,
    driver: Option<JoinHandle<()>>,
}

struct Inner<B: Bootstrapper> {
    bootstrapper: B,
    marker: Option<LaunchMarker>,
    timeout: Duration,
    control: Mutex<Control>,
    outcome: watch::Sender<BootOutcome<B::Store>>,
}

pub struct StartupArbiter<B: Bootstrapper> {
    inner: Arc<Inner<B>>,
}

impl<B: Bootstrapper> StartupArbiter<B> {
    pub fn new(bootstrapper: B) -> Self {
        let (outcome, _) = watch::channel(BootOutcome::Loading);
        Self {
            inner: Arc::new(Inner {
                bootstrapper,
                marker: None,
                timeout: STARTUP_TIMEOUT,
                control: Mutex::new(Control::default()),
                outcome,
            }),
        }
    }

    /// Must be called before the first `start()`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.timeout = timeout;
        }
        self
    }

    /// Must be called before the first `start()`.
    pub fn with_launch_marker(mut self, marker: LaunchMarker) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.marker = Some(marker);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Launches the bootstrap/timeout race. A second call while a run is
    /// started is ignored; use [`retry`](Self::retry) to restart.
    ///
    /// Requires a tokio runtime context.
    pub fn start(&self) {
        let mut control = self.inner.lock_control();
        if control.started {
            debug!("Startup already in progress or resolved; ignoring start");
            return;
        }
        self.start_locked(&mut control);
    }

    /// Cancels any in-flight run and starts again from scratch.
    pub fn retry(&self) {
        let mut control = self.inner.lock_control();
        if let Some(driver) = control.driver.take() {
            driver.abort();
        }
        control.started = false;
        info!(previous_generation = control.generation, "Retrying startup");
        self.start_locked(&mut control);
    }

    pub fn outcome(&self) -> BootOutcome<B::Store> {
        self.inner.outcome.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BootOutcome<B::Store>> {
        self.inner.outcome.subscribe()
    }

    /// Waits until the current run leaves `Loading`.
    pub async fn wait_resolved(&self) -> BootOutcome<B::Store> {
        let mut rx = self.inner.outcome.subscribe();
        if let Ok(outcome) = rx.wait_for(|outcome| !outcome.is_loading()).await {
            return outcome.clone();
        }
        self.outcome()
    }

    fn start_locked(&self, control: &mut Control) {
        control.started = true;
        control.generation += 1;
        let generation = control.generation;

        if let Some(marker) = &self.inner.marker {
            marker.record_launch();
        }

        self.inner.outcome.send_replace(BootOutcome::Loading);
        info!(
            generation,
            timeout_ms = self.inner.timeout.as_millis() as u64,
            "Starting durable store bootstrap"
        );

        let inner = Arc::clone(&self.inner);
        control.driver = Some(tokio::spawn(async move {
            inner.drive(generation).await;
        }));
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.inner.lock_control().generation
    }
}

impl<B: Bootstrapper> Drop for StartupArbiter<B> {
    fn drop(&mut self) {
        if let Some(driver) = self.inner.lock_control().driver.take() {
            driver.abort();
        }
    }
}

impl<B: Bootstrapper> Inner<B> {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn drive(self: Arc<Self>, generation: u64) {
        let outcome = tokio::select! {
            result = self.bootstrapper.bootstrap() => resolve(result),
            _ = tokio::time::sleep(self.timeout) => {
                warn!(
                    generation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Durable store bootstrap timed out; entering safe mode"
                );
                BootOutcome::SafeMode {
                    message: TIMEOUT_MESSAGE.to_string(),
                    mode: BootMode::SafeModeTimeout,
                }
            }
        };

        if !self.commit(generation, outcome) {
            debug!(generation, "Discarding boot outcome from a superseded run");
        }
    }

    /// Applies `outcome` only if `generation` is still current and nothing
    /// has resolved yet. Returns whether it was applied.
    fn commit(&self, generation: u64, outcome: BootOutcome<B::Store>) -> bool {
        let mut control = self.lock_control();
        if control.generation != generation {
            return false;
        }

        let mut outcome = Some(outcome);
        let applied = self.outcome.send_if_modified(|current| {
            if !current.is_loading() {
                return false;
            }
            if let Some(next) = outcome.take() {
                *current = next;
            }
            true
        });

        if applied {
            control.driver = None;
            let summary = self.outcome.borrow().summary();
            info!(
                generation,
                state = summary.state,
                mode = ?summary.mode,
                warning = ?summary.warning,
                message = ?summary.message,
                "Startup resolved"
            );
        }
        applied
    }
}

fn resolve<S>(result: BootstrapResult<S>) -> BootOutcome<S> {
    match result {
        BootstrapResult::Ready {
            store,
            mode,
            warning,
        } => BootOutcome::Ready {
            store: Arc::new(store),
            mode,
            warning: warning.filter(|w| !w.trim().is_empty()),
        },
        BootstrapResult::Failed(error) => {
            let message = if error.trim().is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                error
            };
            warn!(error = %message, "Durable store bootstrap failed; entering safe mode");
            BootOutcome::SafeMode {
                message,
                mode: BootMode::SafeMode,
            }
        }
    }
}

//! Startup arbitration.
//!
//! Decides, once per launch, whether the host may serve live state backed by
//! the durable store or must degrade to a read-only safe mode.
//!
//! ```text
//!            ┌── bootstrap ready ──► Ready(store, mode, warning?)
//! Loading ───┼── bootstrap failed ─► SafeMode(message)
//!            └── 5 s timeout ──────► SafeMode("startup exceeded timeout")
//!
//! retry(): cancel in-flight run ──► Loading (new generation)
//! ```
//!
//! This is the only async part of the core; everything else is synchronous.

mod arbiter;
mod marker;
mod outcome;

pub use arbiter::{StartupArbiter, GENERIC_FAILURE_MESSAGE, STARTUP_TIMEOUT, TIMEOUT_MESSAGE};
pub use marker::{LaunchMarker, LaunchReport};
pub use outcome::{BootMode, BootOutcome, BootSummary, BootstrapResult, Bootstrapper};

//! # shoot-core
//!
//! Core library for Shootclock, a work-session timer for photographers:
//! shoot, then select, then done. Shared by every host (handheld, wrist, CLI).
//!
//! ## Design Principles
//!
//! - **Synchronous session core**: the automaton, duty gate and publisher never suspend.
//! - **Async only at startup**: [`boot::StartupArbiter`] races the durable store
//!   bootstrap against a fixed timeout and falls back to safe mode.
//! - **Graceful degradation**: a missing glance region or config file never blocks timing.
//! - **FFI-ready**: UniFFI annotations enable Swift and Kotlin bindings.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shoot_core::SessionEngine;
//!
//! let engine = SessionEngine::new(None)?;
//! engine.set_on_duty(true);
//! engine.primary_action()?;
//! println!("{}", engine.tick().total_label);
//! ```

// UniFFI scaffolding for Swift/Kotlin bindings
uniffi::setup_scaffolding!();

// Public modules
pub mod boot;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod glance;
pub mod session;
pub mod storage;
pub mod store;
pub mod tags;
pub mod types;

// Re-export commonly used items at crate root
pub use boot::{BootMode, BootOutcome, BootSummary, LaunchMarker, StartupArbiter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::*;
pub use engine::SessionEngine;
pub use error::{ActionRejection, Result, ShootError, ShootFfiError};
pub use glance::{FileRegion, MemoryRegion, SharedRegion, SharedStatePublisher};
pub use session::*;
pub use storage::*;
pub use store::{KeyValueStore, MemoryKv, Store, StoreBootstrapper};
pub use tags::{Tag, TagCatalog, TagGroup};
pub use types::*;

//! Session timing.
//!
//! A work session moves through a fixed, forward-only cycle:
//!
//! ```text
//! Idle ──advance──► Shooting ──advance──► Selecting ──advance──► Ended
//!  ▲                                                              │
//!  └──────────────────────────── advance / reset ─────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`automaton`]: stages, boundary timestamps, elapsed-time accounting
//! - [`duty`]: the on/off-duty precondition around the automaton
//! - [`controller`]: host glue that also publishes the glance snapshot
//! - [`format`]: `MM:SS` display formatting
//!
//! None of this suspends or allocates beyond a label string, so the same core
//! can sit behind any host's event loop.

mod automaton;
mod controller;
mod duty;
mod format;

pub use automaton::{Elapsed, SessionAutomaton, SessionTimestamps, Stage};
pub use controller::{SessionController, TimerReadout};
pub use duty::DutyGate;
pub use format::format_mm_ss;

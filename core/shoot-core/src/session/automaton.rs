//! Stage automaton and duration accounting.
//!
//! Durations are a pure function of (stage, timestamps, now). Every span is
//! clamped at zero so injected clocks or wall-clock adjustments can never
//! produce a negative reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Where in a work session the operator currently is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Shooting,
    Selecting,
    Ended,
}

impl Stage {
    /// Shooting and selecting are the billable, running stages.
    pub fn is_running(self) -> bool {
        matches!(self, Stage::Shooting | Stage::Selecting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Shooting => "shooting",
            Stage::Selecting => "selecting",
            Stage::Ended => "ended",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instants marking stage boundaries. A timestamp is present iff the session
/// has reached the stage it marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTimestamps {
    pub shooting_start: Option<DateTime<Utc>>,
    pub selecting_start: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub total: Duration,
    pub current_stage: Duration,
}

impl Elapsed {
    pub const ZERO: Elapsed = Elapsed {
        total: Duration::ZERO,
        current_stage: Duration::ZERO,
    };
}

#[derive(Debug, Clone, Default)]
pub struct SessionAutomaton {
    stage: Stage,
    timestamps: SessionTimestamps,
}

impl SessionAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn timestamps(&self) -> &SessionTimestamps {
        &self.timestamps
    }

    /// Moves one step forward, wrapping Ended back to Idle.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Stage {
        match self.stage {
            Stage::Idle => {
                self.timestamps.shooting_start = Some(now);
                self.stage = Stage::Shooting;
            }
            Stage::Shooting => {
                self.timestamps.selecting_start = Some(now);
                self.stage = Stage::Selecting;
            }
            Stage::Selecting => {
                self.timestamps.ended_at = Some(now);
                self.stage = Stage::Ended;
            }
            Stage::Ended => self.reset(),
        }
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.timestamps = SessionTimestamps::default();
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Elapsed {
        let ts = &self.timestamps;
        match self.stage {
            Stage::Idle => Elapsed::ZERO,
            Stage::Shooting => match ts.shooting_start {
                Some(start) => {
                    let span = span(start, now);
                    Elapsed {
                        total: span,
                        current_stage: span,
                    }
                }
                None => self.missing_timestamp(),
            },
            Stage::Selecting => match (ts.shooting_start, ts.selecting_start) {
                (Some(shooting), Some(selecting)) => {
                    let shooting_span = span(shooting, selecting);
                    let selecting_span = span(selecting, now);
                    Elapsed {
                        total: shooting_span + selecting_span,
                        current_stage: selecting_span,
                    }
                }
                _ => self.missing_timestamp(),
            },
            Stage::Ended => match (ts.shooting_start, ts.selecting_start, ts.ended_at) {
                (Some(shooting), Some(selecting), Some(ended)) => Elapsed {
                    total: span(shooting, selecting) + span(selecting, ended),
                    current_stage: Duration::ZERO,
                },
                _ => self.missing_timestamp(),
            },
        }
    }

    /// First timestamp the current stage needs but does not have.
    fn missing_field(&self) -> Option<&'static str> {
        let ts = &self.timestamps;
        // Timestamps in the order the stages set them.
        let checks = [
            ("shooting_start", ts.shooting_start.is_some()),
            ("selecting_start", ts.selecting_start.is_some()),
            ("ended_at", ts.ended_at.is_some()),
        ];
        let required = match self.stage {
            Stage::Idle => 0,
            Stage::Shooting => 1,
            Stage::Selecting => 2,
            Stage::Ended => 3,
        };
        checks[..required]
            .iter()
            .find(|(_, present)| !present)
            .map(|(field, _)| *field)
    }

    fn missing_timestamp(&self) -> Elapsed {
        warn!(
            stage = %self.stage,
            field = self.missing_field().unwrap_or("unknown"),
            "Session timestamp missing for current stage; reporting zero elapsed"
        );
        Elapsed::ZERO
    }

    #[cfg(test)]
    pub(crate) fn from_parts(stage: Stage, timestamps: SessionTimestamps) -> Self {
        Self { stage, timestamps }
    }
}

/// `max(0, to - from)` as an unsigned duration.
fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    to.signed_duration_since(from).to_std().unwrap_or(Duration::ZERO)
}

//! Host glue: duty gate + clock + glance publisher.
//!
//! Hosts forward user actions and a ≈1 Hz tick here. The controller owns the
//! notion of the current unbroken running interval, which is what the glance
//! renderer shows as its start instant.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shoot_glance_protocol::{to_region_precision, PublishedSnapshot};
use tracing::debug;

use super::automaton::Stage;
use super::duty::DutyGate;
use super::format::format_mm_ss;
use crate::clock::Clock;
use crate::error::ActionRejection;
use crate::glance::SharedStatePublisher;

/// What a host needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerReadout {
    pub stage: Stage,
    pub on_duty: bool,
    pub is_running: bool,
    #[serde(with = "duration_secs")]
    pub total: Duration,
    #[serde(with = "duration_secs")]
    pub current_stage: Duration,
    pub total_label: String,
    pub stage_label: String,
}

pub struct SessionController<C: Clock> {
    gate: DutyGate,
    clock: C,
    publisher: SharedStatePublisher,
    running_since: Option<DateTime<Utc>>,
}

impl<C: Clock> SessionController<C> {
    pub fn new(clock: C, publisher: SharedStatePublisher) -> Self {
        Self {
            gate: DutyGate::new(),
            clock,
            publisher,
            running_since: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.gate.stage()
    }

    pub fn is_on_duty(&self) -> bool {
        self.gate.is_on_duty()
    }

    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        self.running_since
    }

    pub fn gate(&self) -> &DutyGate {
        &self.gate
    }

    pub fn primary_action(&mut self) -> Result<Stage, ActionRejection> {
        let now = self.clock.now();
        let was_running = self.gate.stage().is_running();
        let stage = self.gate.primary_action(now)?;
        self.after_transition(was_running, now, true);
        Ok(stage)
    }

    pub fn end_session(&mut self) -> Result<Stage, ActionRejection> {
        let now = self.clock.now();
        let before = self.gate.stage();
        let stage = self.gate.end_session(now)?;
        self.after_transition(before.is_running(), now, stage != before);
        Ok(stage)
    }

    pub fn set_on_duty(&mut self, on_duty: bool) {
        let now = self.clock.now();
        let was_running = self.gate.stage().is_running();
        self.gate.set_on_duty(on_duty);
        self.after_transition(was_running, now, false);
    }

    /// Periodic tick. Republishes while running so the renderer's
    /// "last updated" indicator stays fresh.
    pub fn tick(&mut self) -> TimerReadout {
        let now = self.clock.now();
        if self.gate.stage().is_running() {
            self.publisher.publish(true, self.running_since, now);
        }
        self.readout_at(now)
    }

    pub fn readout(&self) -> TimerReadout {
        self.readout_at(self.clock.now())
    }

    /// What the glance renderer would currently see.
    pub fn glance(&self) -> PublishedSnapshot {
        self.publisher.read(self.clock.now())
    }

    fn readout_at(&self, now: DateTime<Utc>) -> TimerReadout {
        let elapsed = self.gate.elapsed(now);
        let stage = self.gate.stage();
        TimerReadout {
            stage,
            on_duty: self.gate.is_on_duty(),
            is_running: stage.is_running(),
            total: elapsed.total,
            current_stage: elapsed.current_stage,
            total_label: format_mm_ss(elapsed.total),
            stage_label: format_mm_ss(elapsed.current_stage),
        }
    }

    fn after_transition(&mut self, was_running: bool, now: DateTime<Utc>, stage_changed: bool) {
        let is_running = self.gate.stage().is_running();
        match (was_running, is_running) {
            (false, true) => self.running_since = Some(to_region_precision(now)),
            (true, false) => self.running_since = None,
            _ => {}
        }

        if was_running != is_running || stage_changed {
            debug!(
                stage = %self.gate.stage(),
                is_running,
                "Publishing glance snapshot after transition"
            );
            self.publisher.publish(is_running, self.running_since, now);
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

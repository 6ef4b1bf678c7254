//! On/off duty precondition wrapped around the automaton.
//!
//! Going off duty discards the session in progress. There is no persistence
//! of an unfinished session across a duty toggle.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::automaton::{Elapsed, SessionAutomaton, SessionTimestamps, Stage};
use crate::error::ActionRejection;

#[derive(Debug, Clone, Default)]
pub struct DutyGate {
    on_duty: bool,
    automaton: SessionAutomaton,
}

impl DutyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on_duty(&self) -> bool {
        self.on_duty
    }

    pub fn stage(&self) -> Stage {
        self.automaton.stage()
    }

    pub fn timestamps(&self) -> &SessionTimestamps {
        self.automaton.timestamps()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Elapsed {
        self.automaton.elapsed(now)
    }

    /// Advances the session one step, if on duty.
    pub fn primary_action(&mut self, now: DateTime<Utc>) -> Result<Stage, ActionRejection> {
        if !self.on_duty {
            debug!(stage = %self.automaton.stage(), "Primary action rejected: not on duty");
            return Err(ActionRejection::NotOnDuty);
        }
        Ok(self.automaton.advance(now))
    }

    /// Jumps straight to Ended.
    ///
    /// Only selecting can end; from shooting the request is rejected, and from
    /// idle or ended there is nothing to end so the stage is returned as is.
    pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<Stage, ActionRejection> {
        if !self.on_duty {
            return Err(ActionRejection::NotOnDuty);
        }
        match self.automaton.stage() {
            Stage::Shooting => {
                debug!("End request rejected while shooting");
                Err(ActionRejection::CannotEndWhileShooting)
            }
            Stage::Selecting => Ok(self.automaton.advance(now)),
            stage @ (Stage::Idle | Stage::Ended) => Ok(stage),
        }
    }

    pub fn set_on_duty(&mut self, on_duty: bool) {
        let was_on_duty = self.on_duty;
        self.on_duty = on_duty;
        if !on_duty {
            if was_on_duty && self.automaton.stage() != Stage::Idle {
                info!(
                    discarded_stage = %self.automaton.stage(),
                    "Went off duty; discarding session in progress"
                );
            }
            self.automaton.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    fn gate_at_stage(steps: i64) -> DutyGate {
        let mut gate = DutyGate::new();
        gate.set_on_duty(true);
        for i in 0..steps {
            gate.primary_action(at(i * 10)).expect("on duty");
        }
        gate
    }

    #[test]
    fn starts_off_duty_and_idle() {
        let gate = DutyGate::new();
        assert!(!gate.is_on_duty());
        assert_eq!(gate.stage(), Stage::Idle);
    }

    #[test]
    fn off_duty_action_is_rejected_without_mutation() {
        for steps in 0..4 {
            let mut gate = gate_at_stage(steps);
            gate.on_duty = false;
            let stage = gate.stage();
            let timestamps = *gate.timestamps();

            assert_eq!(
                gate.primary_action(at(500)),
                Err(ActionRejection::NotOnDuty)
            );
            assert_eq!(gate.stage(), stage);
            assert_eq!(*gate.timestamps(), timestamps);
        }
    }

    #[test]
    fn on_duty_action_advances() {
        let mut gate = gate_at_stage(0);
        assert_eq!(gate.primary_action(at(0)), Ok(Stage::Shooting));
        assert_eq!(gate.primary_action(at(30)), Ok(Stage::Selecting));
        assert_eq!(gate.elapsed(at(50)).total.as_secs(), 50);
    }

    #[test]
    fn going_off_duty_always_resets() {
        for steps in 0..4 {
            let mut gate = gate_at_stage(steps);
            gate.set_on_duty(false);
            assert_eq!(gate.stage(), Stage::Idle);
            assert_eq!(*gate.timestamps(), SessionTimestamps::default());
        }
    }

    #[test]
    fn going_on_duty_keeps_state() {
        let mut gate = gate_at_stage(2);
        gate.set_on_duty(true);
        assert_eq!(gate.stage(), Stage::Selecting);
    }

    #[test]
    fn end_is_rejected_while_shooting() {
        let mut gate = gate_at_stage(1);
        let before = *gate.timestamps();
        assert_eq!(
            gate.end_session(at(100)),
            Err(ActionRejection::CannotEndWhileShooting)
        );
        assert_eq!(gate.stage(), Stage::Shooting);
        assert_eq!(*gate.timestamps(), before);
    }

    #[test]
    fn end_from_selecting_finishes_session() {
        let mut gate = gate_at_stage(2);
        assert_eq!(gate.end_session(at(90)), Ok(Stage::Ended));
        assert_eq!(gate.timestamps().ended_at, Some(at(90)));
    }

    #[test]
    fn end_from_idle_or_ended_is_noop() {
        let mut idle = gate_at_stage(0);
        assert_eq!(idle.end_session(at(5)), Ok(Stage::Idle));

        let mut ended = gate_at_stage(3);
        assert_eq!(ended.end_session(at(500)), Ok(Stage::Ended));
        assert_eq!(ended.timestamps().ended_at, Some(at(20)));
    }

    #[test]
    fn end_requires_duty() {
        let mut gate = DutyGate::new();
        assert_eq!(gate.end_session(at(0)), Err(ActionRejection::NotOnDuty));
    }
}

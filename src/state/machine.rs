use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionPhase};
#[cfg(test)]
use super::StateTransition;

#[derive(Debug)]
pub struct StateMachine {
    phase: SessionPhase,
    #[cfg(test)]
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new(initial: SessionPhase) -> Self {
        Self {
            phase: initial,
            #[cfg(test)]
            transition_history: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_phase(event).is_some()
    }

    pub fn next_phase(&self, event: SessionEvent) -> Option<SessionPhase> {
        use SessionEvent::*;
        match (self.phase, event) {
            (SessionPhase::Closed, _) => None,
            (_, Close) => Some(SessionPhase::Closed),
            (_, CameraFailed) => Some(SessionPhase::PermissionDenied),
            (SessionPhase::PermissionDenied, CameraRecovered) => Some(SessionPhase::IdleLive),
            (SessionPhase::IdleLive, Capture) => Some(SessionPhase::Analyzing),
            (SessionPhase::IdleLive, ApplyTemplate) => Some(SessionPhase::Result),
            (SessionPhase::Analyzing, ApplyTemplate) => Some(SessionPhase::Result),
            (SessionPhase::Result, ApplyTemplate) => Some(SessionPhase::Result),
            (SessionPhase::Analyzing, AnalysisSucceeded) => Some(SessionPhase::Result),
            (SessionPhase::Analyzing, AnalysisFailed) => Some(SessionPhase::IdleLive),
            (SessionPhase::Analyzing, Retake) => Some(SessionPhase::IdleLive),
            (SessionPhase::Result, Retake) => Some(SessionPhase::IdleLive),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionPhase> {
        tracing::debug!(from = ?self.phase, event = ?event, "request session transition");
        let next = self.next_phase(event).ok_or_else(|| {
            let from = self.phase;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        #[cfg(test)]
        self.transition_history
            .push(StateTransition::new(self.phase, event, next));
        self.phase = next;

        Ok(self.phase)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(SessionPhase::IdleLive)
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionPhase::{:?}", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = StateMachine::default();
        assert!(machine.can_transition(SessionEvent::Capture));
        assert!(machine.can_transition(SessionEvent::ApplyTemplate));
        assert!(!machine.can_transition(SessionEvent::AnalysisSucceeded));
        assert!(!machine.can_transition(SessionEvent::Retake));

        let _ = machine
            .transition(SessionEvent::Capture)
            .expect("idle -> analyzing should transition");

        assert!(machine.can_transition(SessionEvent::AnalysisSucceeded));
        assert!(machine.can_transition(SessionEvent::AnalysisFailed));
        assert!(!machine.can_transition(SessionEvent::Capture));
    }

    #[test]
    fn fresh_flow_records_history_with_ordered_entries() {
        let mut machine = StateMachine::default();
        let _ = machine
            .transition(SessionEvent::Capture)
            .expect("capture should work");
        let _ = machine
            .transition(SessionEvent::AnalysisSucceeded)
            .expect("analysis success should work");
        let _ = machine
            .transition(SessionEvent::Retake)
            .expect("retake should work");

        assert_eq!(machine.phase(), SessionPhase::IdleLive);
        assert_eq!(
            machine.history(),
            &[
                StateTransition::new(
                    SessionPhase::IdleLive,
                    SessionEvent::Capture,
                    SessionPhase::Analyzing
                ),
                StateTransition::new(
                    SessionPhase::Analyzing,
                    SessionEvent::AnalysisSucceeded,
                    SessionPhase::Result
                ),
                StateTransition::new(
                    SessionPhase::Result,
                    SessionEvent::Retake,
                    SessionPhase::IdleLive
                ),
            ]
        );
    }

    #[test]
    fn template_flow_skips_analyzing() {
        let mut machine = StateMachine::default();
        let phase = machine
            .transition(SessionEvent::ApplyTemplate)
            .expect("idle -> result via template");
        assert_eq!(phase, SessionPhase::Result);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn analysis_failure_returns_to_live_feed() {
        let mut machine = StateMachine::default();
        let _ = machine
            .transition(SessionEvent::Capture)
            .expect("capture should work");
        let phase = machine
            .transition(SessionEvent::AnalysisFailed)
            .expect("failure should work");
        assert_eq!(phase, SessionPhase::IdleLive);
    }

    #[test]
    fn camera_failure_is_reachable_from_every_phase() {
        for start in [
            SessionPhase::IdleLive,
            SessionPhase::Analyzing,
            SessionPhase::Result,
            SessionPhase::PermissionDenied,
        ] {
            let machine = StateMachine::new(start);
            assert_eq!(
                machine.next_phase(SessionEvent::CameraFailed),
                Some(SessionPhase::PermissionDenied)
            );
        }
    }

    #[test]
    fn closed_is_terminal_from_every_phase() {
        for start in [
            SessionPhase::IdleLive,
            SessionPhase::Analyzing,
            SessionPhase::Result,
            SessionPhase::PermissionDenied,
        ] {
            let mut machine = StateMachine::new(start);
            let phase = machine
                .transition(SessionEvent::Close)
                .expect("close should work from any open phase");
            assert_eq!(phase, SessionPhase::Closed);

            for event in [
                SessionEvent::Capture,
                SessionEvent::ApplyTemplate,
                SessionEvent::Retake,
                SessionEvent::CameraFailed,
                SessionEvent::CameraRecovered,
                SessionEvent::Close,
            ] {
                assert!(!machine.can_transition(event), "{event:?} should be rejected");
            }
        }
    }

    #[test]
    fn permission_denied_only_leaves_through_recovery() {
        let mut machine = StateMachine::new(SessionPhase::PermissionDenied);
        for event in [
            SessionEvent::Capture,
            SessionEvent::ApplyTemplate,
            SessionEvent::AnalysisSucceeded,
            SessionEvent::Retake,
        ] {
            assert!(!machine.can_transition(event), "{event:?} should be rejected");
        }

        let phase = machine
            .transition(SessionEvent::CameraRecovered)
            .expect("recovery should work");
        assert_eq!(phase, SessionPhase::IdleLive);
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = StateMachine::default();

        let err = machine
            .transition(SessionEvent::AnalysisSucceeded)
            .expect_err("idle -> analysis succeeded should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: SessionPhase::IdleLive,
                event: SessionEvent::AnalysisSucceeded
            }
        ));
        assert_eq!(machine.phase(), SessionPhase::IdleLive);
        assert!(machine.history().is_empty());
    }
}

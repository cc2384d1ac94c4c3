use super::model::SessionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Capture trigger on a fresh form; snapshot goes to detection.
    Capture,
    /// Capture trigger (or template switch) served by the remapper.
    ApplyTemplate,
    AnalysisSucceeded,
    AnalysisFailed,
    Retake,
    CameraFailed,
    CameraRecovered,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionPhase,
    pub event: SessionEvent,
    pub to: SessionPhase,
}

impl StateTransition {
    pub const fn new(from: SessionPhase, event: SessionEvent, to: SessionPhase) -> Self {
        Self { from, event, to }
    }
}

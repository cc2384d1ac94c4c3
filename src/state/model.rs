/// Lifecycle phase of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Camera feed running, no result yet.
    IdleLive,
    /// A detection request is in flight.
    Analyzing,
    /// An overlay set exists and is being presented.
    Result,
    /// Camera acquisition failed; only a retry leaves this phase.
    PermissionDenied,
    /// Torn down after completion or close; no further events apply.
    Closed,
}

impl SessionPhase {
    pub const fn has_result(self) -> bool {
        matches!(self, Self::Result)
    }
}

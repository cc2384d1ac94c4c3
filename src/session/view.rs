use crate::guidance::{GuidanceState, Marker};
use crate::overlay::OverlaySet;
use crate::state::SessionPhase;

use super::SessionNotice;

/// What the presentation layer should draw for the current phase.
#[derive(Debug, Clone, Copy)]
pub enum Presentation<'a> {
    LiveFeed,
    Analyzing,
    PermissionDenied,
    /// The session was completed or closed; nothing is presented.
    Closed,
    /// Analysis succeeded with zero fields: show an explicit "no fields
    /// found" outcome and no navigation controls.
    NoFieldsFound { overlay: Option<&'a OverlaySet> },
    Fields {
        overlay: &'a OverlaySet,
        guidance: &'a GuidanceState,
    },
}

/// Read-only snapshot of a capture session.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub phase: SessionPhase,
    pub presentation: Presentation<'a>,
    pub notice: Option<&'a SessionNotice>,
}

impl<'a> SessionView<'a> {
    pub(super) fn new(
        phase: SessionPhase,
        presentation: Presentation<'a>,
        notice: Option<&'a SessionNotice>,
    ) -> Self {
        Self {
            phase,
            presentation,
            notice,
        }
    }

    pub fn overlay(&self) -> Option<&'a OverlaySet> {
        match self.presentation {
            Presentation::Fields { overlay, .. } => Some(overlay),
            Presentation::NoFieldsFound { overlay } => overlay,
            _ => None,
        }
    }

    pub fn guidance(&self) -> Option<&'a GuidanceState> {
        match self.presentation {
            Presentation::Fields { guidance, .. } => Some(guidance),
            _ => None,
        }
    }

    /// Navigation controls are shown only in guided mode with fields present.
    pub fn shows_navigation(&self) -> bool {
        self.guidance().is_some_and(GuidanceState::is_guided)
    }

    pub fn markers(&self) -> Vec<Marker<'a>> {
        match self.presentation {
            Presentation::Fields { overlay, guidance } => guidance.markers(overlay),
            _ => Vec::new(),
        }
    }

    /// `(step, total, field name)` for the guided-mode caption.
    pub fn step_label(&self) -> Option<(usize, usize, &'a str)> {
        let Presentation::Fields { overlay, guidance } = self.presentation else {
            return None;
        };
        let field = guidance.active_field(overlay)?;
        let (step, total) = guidance.step();
        Some((step, total, field.name.as_str()))
    }
}

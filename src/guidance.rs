use crate::geometry::Placement;
use crate::overlay::{Field, OverlaySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// One field highlighted at a time, the rest suppressed.
    Guided,
    /// Every field rendered with its value.
    Full,
}

impl PresentationMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Guided => Self::Full,
            Self::Full => Self::Guided,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerVisibility {
    Active,
    Annotated,
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker<'a> {
    pub index: usize,
    pub field: &'a Field,
    pub placement: Placement,
    pub visibility: MarkerVisibility,
}

/// Step-by-step navigation over a non-empty field list.
///
/// Only constructible for at least one field, so `active_index` is always in
/// `0..field_count`. Navigation past either end is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidanceState {
    mode: PresentationMode,
    active_index: usize,
    field_count: usize,
}

impl GuidanceState {
    /// Returns `None` for an empty field set; guided mode is never entered then.
    pub fn for_fields(field_count: usize) -> Option<Self> {
        (field_count > 0).then_some(Self {
            mode: PresentationMode::Guided,
            active_index: 0,
            field_count,
        })
    }

    pub fn for_overlay(overlay: &OverlaySet) -> Option<Self> {
        Self::for_fields(overlay.len())
    }

    pub const fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    pub const fn field_count(&self) -> usize {
        self.field_count
    }

    pub const fn is_guided(&self) -> bool {
        matches!(self.mode, PresentationMode::Guided)
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Advances one field. Returns whether the active field changed.
    pub fn next(&mut self) -> bool {
        if !self.is_guided() {
            tracing::debug!("ignoring next outside guided mode");
            return false;
        }
        if self.active_index + 1 >= self.field_count {
            return false;
        }
        self.active_index += 1;
        true
    }

    /// Steps back one field. Returns whether the active field changed.
    pub fn previous(&mut self) -> bool {
        if !self.is_guided() {
            tracing::debug!("ignoring previous outside guided mode");
            return false;
        }
        if self.active_index == 0 {
            return false;
        }
        self.active_index -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.mode = PresentationMode::Guided;
        self.active_index = 0;
    }

    /// 1-based step number and total, as shown in "Step 2 of 5".
    pub const fn step(&self) -> (usize, usize) {
        (self.active_index + 1, self.field_count)
    }

    pub fn visibility(&self, index: usize) -> MarkerVisibility {
        match self.mode {
            PresentationMode::Full => MarkerVisibility::Annotated,
            PresentationMode::Guided if index == self.active_index => MarkerVisibility::Active,
            PresentationMode::Guided => MarkerVisibility::Suppressed,
        }
    }

    pub fn active_field<'a>(&self, overlay: &'a OverlaySet) -> Option<&'a Field> {
        if self.is_guided() {
            overlay.field(self.active_index)
        } else {
            None
        }
    }

    pub fn markers<'a>(&self, overlay: &'a OverlaySet) -> Vec<Marker<'a>> {
        overlay
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| Marker {
                index,
                field,
                placement: field.placement(),
                visibility: self.visibility(index),
            })
            .collect()
    }
}

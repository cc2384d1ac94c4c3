use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::camera::{acquire_with_fallback, CameraError, CameraSource, CapturedImage};
use crate::detect::{DetectedField, DetectionResult};
use crate::guidance::{GuidanceState, Marker};
use crate::overlay::OverlaySet;
use crate::profile::UserProfile;
use crate::remap::remap_template;
use crate::state::{SessionEvent, SessionPhase, StateError, StateMachine};
use crate::storage::{FormRecord, StorageError, TemplateStore};
use crate::template::Template;

mod view;

pub use view::{Presentation, SessionView};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("camera unavailable: {0}")]
    Camera(#[from] CameraError),
    #[error("no analysis result is being presented")]
    NoResult,
    #[error("template lookup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },
    #[error("capture session is closed")]
    Closed,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub prefer_rear_camera: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prefer_rear_camera: true,
        }
    }
}

/// Identifies one detection request. Results carrying an older epoch than the
/// session's current one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    epoch: u64,
}

impl AnalysisTicket {
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Everything a detector needs, detached from the session so it can run
/// elsewhere.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticket: AnalysisTicket,
    pub image: CapturedImage,
    pub profile: UserProfile,
}

#[derive(Debug)]
pub enum CaptureOutcome {
    AwaitingAnalysis(AnalysisRequest),
    Presented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Presented { fields: usize },
    NoFieldsFound,
    Failed,
    Stale,
}

/// Messages the presentation layer should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    AnalysisFailed { message: String },
    CameraUnavailable { message: String },
    FieldsDropped { count: usize },
}

/// Discrete events sent back by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Next,
    Previous,
    ToggleMode,
    Retake,
    Capture,
    SelectTemplate(String),
}

#[derive(Debug)]
pub enum EventOutcome {
    Updated,
    Unchanged,
    AnalysisRequested(AnalysisRequest),
}

#[derive(Debug)]
struct PresentedResult {
    overlay: OverlaySet,
    /// `None` when the overlay has no fields.
    guidance: Option<GuidanceState>,
}

/// Top-level controller for one scanning flow.
///
/// Owns the camera, the current overlay set and the guidance state. Every
/// method runs to completion; detection is the only step that happens
/// outside, handed off through [`AnalysisRequest`] and handed back with
/// [`CaptureSession::complete_analysis`].
pub struct CaptureSession<C: CameraSource> {
    machine: StateMachine,
    camera: C,
    camera_held: bool,
    options: SessionOptions,
    profile: UserProfile,
    template: Option<Template>,
    pending_image: Option<CapturedImage>,
    result: Option<PresentedResult>,
    epoch: u64,
    notice: Option<SessionNotice>,
}

impl<C: CameraSource> CaptureSession<C> {
    /// Acquires the camera and enters `IdleLive`, or `PermissionDenied` when
    /// acquisition fails.
    pub fn start(camera: C, profile: UserProfile, options: SessionOptions) -> Self {
        let mut session = Self {
            machine: StateMachine::new(SessionPhase::IdleLive),
            camera,
            camera_held: false,
            options,
            profile,
            template: None,
            pending_image: None,
            result: None,
            epoch: 0,
            notice: None,
        };
        if let Err(err) = session.acquire_camera() {
            session.enter_permission_denied(&err);
        }
        tracing::info!(phase = ?session.phase(), "capture session started");
        session
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn is_closed(&self) -> bool {
        self.phase() == SessionPhase::Closed
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Replaces the profile used by later captures and remaps.
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
    }

    pub fn notice(&self) -> Option<&SessionNotice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn overlay(&self) -> Option<&OverlaySet> {
        self.result.as_ref().map(|result| &result.overlay)
    }

    pub fn guidance(&self) -> Option<&GuidanceState> {
        self.result.as_ref().and_then(|result| result.guidance.as_ref())
    }

    /// The captured image while a result is presented.
    pub fn captured_image(&self) -> Option<&CapturedImage> {
        self.overlay().map(OverlaySet::image)
    }

    pub fn markers(&self) -> Vec<Marker<'_>> {
        match self.result.as_ref() {
            Some(PresentedResult {
                overlay,
                guidance: Some(guidance),
            }) => guidance.markers(overlay),
            _ => Vec::new(),
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        let presentation = match (self.phase(), self.result.as_ref()) {
            (SessionPhase::IdleLive, _) => Presentation::LiveFeed,
            (SessionPhase::Analyzing, _) => Presentation::Analyzing,
            (SessionPhase::PermissionDenied, _) => Presentation::PermissionDenied,
            (SessionPhase::Closed, _) => Presentation::Closed,
            (
                SessionPhase::Result,
                Some(PresentedResult {
                    overlay,
                    guidance: Some(guidance),
                }),
            ) => Presentation::Fields { overlay, guidance },
            (SessionPhase::Result, _) => Presentation::NoFieldsFound {
                overlay: self.overlay(),
            },
        };
        SessionView::new(self.phase(), presentation, self.notice.as_ref())
    }

    /// Snapshots the current frame. A fresh form yields a detection request;
    /// with a template selected the remapped result is presented directly.
    pub fn capture(&mut self) -> SessionResult<CaptureOutcome> {
        self.ensure_open()?;
        let event = if self.template.is_some() {
            SessionEvent::ApplyTemplate
        } else {
            SessionEvent::Capture
        };
        if self.phase() != SessionPhase::IdleLive {
            return Err(StateError::InvalidStateTransition {
                from: self.phase(),
                event,
            }
            .into());
        }

        let image = match self
            .camera
            .current_frame()
            .and_then(CapturedImage::snapshot)
        {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(%err, "failed to snapshot camera frame");
                self.enter_permission_denied(&err);
                return Err(err.into());
            }
        };
        self.camera.pause();
        self.notice = None;

        if let Some(template) = self.template.as_ref() {
            let overlay = remap_template(template, &self.profile, image);
            self.machine.transition(event)?;
            self.release_camera();
            self.present(overlay);
            return Ok(CaptureOutcome::Presented);
        }

        self.machine.transition(event)?;
        self.epoch += 1;
        self.pending_image = Some(image.clone());
        tracing::info!(
            epoch = self.epoch,
            capture_id = image.capture_id(),
            "requesting form analysis"
        );
        Ok(CaptureOutcome::AwaitingAnalysis(AnalysisRequest {
            ticket: AnalysisTicket { epoch: self.epoch },
            image,
            profile: self.profile.clone(),
        }))
    }

    /// Applies a detection result, unless the session has moved on since the
    /// request was issued.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: DetectionResult<Vec<DetectedField>>,
    ) -> SessionResult<AnalysisOutcome> {
        if ticket.epoch != self.epoch || self.phase() != SessionPhase::Analyzing {
            tracing::warn!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                phase = ?self.phase(),
                "dropping stale analysis result"
            );
            return Ok(AnalysisOutcome::Stale);
        }
        let Some(image) = self.pending_image.take() else {
            tracing::warn!("analysis finished without a pending capture");
            return Ok(AnalysisOutcome::Stale);
        };

        match result {
            Ok(detected) => {
                let overlay = OverlaySet::from_detection(image, detected);
                self.machine.transition(SessionEvent::AnalysisSucceeded)?;
                self.release_camera();
                let fields = overlay.len();
                self.present(overlay);
                if fields == 0 {
                    tracing::info!("analysis found no fields");
                    Ok(AnalysisOutcome::NoFieldsFound)
                } else {
                    Ok(AnalysisOutcome::Presented { fields })
                }
            }
            Err(err) => {
                tracing::warn!(%err, "form analysis failed; resuming camera");
                self.machine.transition(SessionEvent::AnalysisFailed)?;
                self.camera.resume();
                self.notice = Some(SessionNotice::AnalysisFailed {
                    message: err.to_string(),
                });
                Ok(AnalysisOutcome::Failed)
            }
        }
    }

    /// Discards the current result (or in-flight analysis) and returns to the
    /// live feed.
    pub fn retake(&mut self) -> SessionResult<()> {
        self.ensure_open()?;
        let from = self.phase();
        if !self.machine.can_transition(SessionEvent::Retake) {
            return Err(StateError::InvalidStateTransition {
                from,
                event: SessionEvent::Retake,
            }
            .into());
        }

        self.epoch += 1;
        self.pending_image = None;
        self.result = None;
        self.notice = None;
        self.machine.transition(SessionEvent::Retake)?;

        if self.camera_held {
            self.camera.resume();
            return Ok(());
        }
        if let Err(err) = self.acquire_camera() {
            self.enter_permission_denied(&err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Retries camera acquisition from `PermissionDenied`.
    pub fn retry_camera(&mut self) -> SessionResult<()> {
        self.ensure_open()?;
        if !self.machine.can_transition(SessionEvent::CameraRecovered) {
            return Err(StateError::InvalidStateTransition {
                from: self.phase(),
                event: SessionEvent::CameraRecovered,
            }
            .into());
        }
        match self.acquire_camera() {
            Ok(()) => {
                self.machine.transition(SessionEvent::CameraRecovered)?;
                self.notice = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "camera retry failed");
                self.notice = Some(SessionNotice::CameraUnavailable {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Reports a camera failure observed outside a session call, such as a
    /// device disconnect.
    pub fn report_camera_failure(&mut self, err: CameraError) {
        if self.is_closed() {
            return;
        }
        self.enter_permission_denied(&err);
    }

    /// Selects the template used for remapping. While a result is presented
    /// or analysis is running, the captured image is remapped right away.
    pub fn select_template(&mut self, template: Template) -> SessionResult<()> {
        self.ensure_open()?;
        tracing::info!(template_id = %template.id, phase = ?self.phase(), "template selected");
        let image = match self.phase() {
            SessionPhase::Analyzing => self.pending_image.take(),
            SessionPhase::Result => self.captured_image().cloned(),
            SessionPhase::IdleLive | SessionPhase::PermissionDenied | SessionPhase::Closed => None,
        };
        self.template = Some(template);

        let (Some(image), Some(template)) = (image, self.template.as_ref()) else {
            return Ok(());
        };
        let overlay = remap_template(template, &self.profile, image);
        self.epoch += 1;
        self.machine.transition(SessionEvent::ApplyTemplate)?;
        self.release_camera();
        self.present(overlay);
        Ok(())
    }

    pub fn select_template_by_id<S: TemplateStore + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
    ) -> SessionResult<()> {
        let template = store
            .get(id)?
            .ok_or_else(|| SessionError::TemplateNotFound { id: id.to_string() })?;
        self.select_template(template)
    }

    pub fn clear_template(&mut self) {
        self.template = None;
    }

    /// Moves to the next field. No-op outside guided mode, at the last field,
    /// or when no fields were found.
    pub fn next(&mut self) -> bool {
        self.with_guidance(GuidanceState::next)
    }

    /// Moves to the previous field. No-op outside guided mode, at the first
    /// field, or when no fields were found.
    pub fn previous(&mut self) -> bool {
        self.with_guidance(GuidanceState::previous)
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.with_guidance(|guidance| {
            guidance.toggle_mode();
            true
        })
    }

    pub fn handle<S: TemplateStore + ?Sized>(
        &mut self,
        event: UiEvent,
        templates: &S,
    ) -> SessionResult<EventOutcome> {
        tracing::debug!(?event, phase = ?self.phase(), "handling ui event");
        let changed = match event {
            UiEvent::Next => self.next(),
            UiEvent::Previous => self.previous(),
            UiEvent::ToggleMode => self.toggle_mode(),
            UiEvent::Retake => {
                self.retake()?;
                true
            }
            UiEvent::Capture => {
                return match self.capture()? {
                    CaptureOutcome::AwaitingAnalysis(request) => {
                        Ok(EventOutcome::AnalysisRequested(request))
                    }
                    CaptureOutcome::Presented => Ok(EventOutcome::Updated),
                };
            }
            UiEvent::SelectTemplate(id) => {
                self.select_template_by_id(templates, &id)?;
                true
            }
        };
        Ok(if changed {
            EventOutcome::Updated
        } else {
            EventOutcome::Unchanged
        })
    }

    /// Stores the presented layout as a reusable template.
    pub fn save_as_template(&self, name: &str, now: DateTime<Utc>) -> SessionResult<Template> {
        let overlay = self.overlay().ok_or(SessionError::NoResult)?;
        let template = Template::new(name, overlay.fields().to_vec(), now);
        tracing::info!(template_id = %template.id, name = %template.name, "saved template");
        Ok(template)
    }

    /// Finishes the scan and tears the session down.
    pub fn complete(&mut self, now: DateTime<Utc>) -> SessionResult<FormRecord> {
        self.ensure_open()?;
        if self.overlay().is_none() {
            return Err(SessionError::NoResult);
        }
        let record = FormRecord::completed(now);
        self.close();
        Ok(record)
    }

    /// Releases the camera, invalidates any in-flight analysis and moves the
    /// session to `Closed`.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Err(err) = self.machine.transition(SessionEvent::Close) {
            tracing::warn!(%err, "close transition rejected");
        }
        self.epoch += 1;
        self.pending_image = None;
        self.result = None;
        self.release_camera();
        tracing::info!("capture session closed");
    }

    fn with_guidance<F>(&mut self, apply: F) -> bool
    where
        F: FnOnce(&mut GuidanceState) -> bool,
    {
        match self
            .result
            .as_mut()
            .and_then(|result| result.guidance.as_mut())
        {
            Some(guidance) => apply(guidance),
            None => {
                tracing::debug!(phase = ?self.machine.phase(), "no guided fields; ignoring navigation");
                false
            }
        }
    }

    fn present(&mut self, overlay: OverlaySet) {
        let dropped = overlay.dropped_fields();
        if dropped > 0 {
            self.notice = Some(SessionNotice::FieldsDropped { count: dropped });
        }
        let guidance = GuidanceState::for_overlay(&overlay);
        self.result = Some(PresentedResult { overlay, guidance });
    }

    fn acquire_camera(&mut self) -> Result<(), CameraError> {
        self.release_camera();
        let facing = acquire_with_fallback(&mut self.camera, self.options.prefer_rear_camera)?;
        self.camera_held = true;
        tracing::debug!(?facing, "camera acquired");
        Ok(())
    }

    fn release_camera(&mut self) {
        if self.camera_held {
            self.camera.release();
            self.camera_held = false;
        }
    }

    fn enter_permission_denied(&mut self, err: &CameraError) {
        tracing::warn!(%err, "camera unavailable");
        self.release_camera();
        self.epoch += 1;
        self.pending_image = None;
        self.result = None;
        self.notice = Some(SessionNotice::CameraUnavailable {
            message: err.to_string(),
        });
        if let Err(err) = self.machine.transition(SessionEvent::CameraFailed) {
            tracing::warn!(%err, "camera failure transition rejected");
        }
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

impl<C: CameraSource> Drop for CaptureSession<C> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

pub mod app;
pub mod assist;
pub mod camera;
pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod guidance;
pub mod logging;
pub mod notification;
pub mod overlay;
pub mod profile;
pub mod remap;
pub mod session;
pub mod state;
pub mod storage;
pub mod template;
pub mod worker;
pub use error::{AppError, AppResult};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use app::{reduce, AppAction, AppState};
use camera::StillImageCamera;
use detect::ResponseFileDetector;
use notification::{notify_session, DesktopNotifier};
use session::{CaptureOutcome, CaptureSession, SessionError, SessionOptions, SessionView};
use state::SessionPhase;
use storage::{HistoryStore, ProfileStore, StorageService, TemplateStore};

/// Entrypoint used by the command-line binary.
///
/// `args` are `<image-path> [template-id]`. Without a template the form is
/// analysed from the recorded detection response stored next to the image
/// (`<image-path>.fields.json`).
pub fn run<I>(args: I) -> AppResult<()>
where
    I: IntoIterator<Item = String>,
{
    logging::init();
    let mut args = args.into_iter();
    let image_path = PathBuf::from(args.next().ok_or(AppError::Usage)?);
    let template_id = args.next();
    tracing::info!(image = %image_path.display(), template_id = ?template_id, "starting formguide");

    let config = config::load_app_config();
    let store = match config.data_dir.clone() {
        Some(dir) => StorageService::with_data_dir(dir),
        None => StorageService::with_default_paths()?,
    };
    let profile = store.load_profile()?.unwrap_or_default();
    let state = AppState::restored(
        config.language(),
        Some(profile.clone()),
        store.list_templates()?,
        store.list_history()?,
    );
    let state = match template_id {
        Some(id) => {
            let state = reduce(state, AppAction::OpenTemplate(id.clone()));
            if state.selected_template.is_none() {
                return Err(SessionError::TemplateNotFound { id }.into());
            }
            state
        }
        None => reduce(state, AppAction::OpenScanner),
    };

    let options = SessionOptions {
        prefer_rear_camera: config.prefer_rear_camera,
    };
    let camera = StillImageCamera::new(&image_path);
    tracing::debug!(path = %camera.path().display(), "opening still-image camera");
    let mut session = CaptureSession::start(camera, profile, options);
    if let Some(template) = state.selected_template.clone() {
        session = session.with_template(template);
    }
    if session.phase() == SessionPhase::PermissionDenied {
        session.retry_camera()?;
    }

    match session.capture()? {
        CaptureOutcome::Presented => {}
        CaptureOutcome::AwaitingAnalysis(request) => {
            let response = recorded_response_path(&image_path);
            if !response.exists() {
                println!(
                    "no detector configured: record a detection response at {}",
                    response.display()
                );
                return Ok(());
            }
            let detector = Arc::new(ResponseFileDetector::new(response));
            let (ticket, result) =
                worker::spawn_detection(detector, request, config.analysis_timeout()).wait();
            session.complete_analysis(ticket, result)?;
        }
    }

    if let Some(notice) = session.notice() {
        eprintln!("{}", notification::notice_message(notice));
        notify_session(&DesktopNotifier, notice);
    }
    print_view(&session.view());

    if session.overlay().is_none() {
        return Ok(());
    }
    let record = session.complete(chrono::Utc::now())?;
    store.record(record.clone())?;
    let state = reduce(state, AppAction::CompleteScan(record));
    tracing::info!(forms_completed = state.history.len(), "scan complete");
    Ok(())
}

fn recorded_response_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.as_os_str().to_owned();
    name.push(".fields.json");
    PathBuf::from(name)
}

fn print_view(view: &SessionView<'_>) {
    let Some(overlay) = view.overlay() else {
        println!("no result ({:?})", view.phase);
        return;
    };
    if overlay.is_empty() {
        println!("no fields found");
        return;
    }
    let bounds = overlay.image().bounds();
    for (index, field) in overlay.fields().iter().enumerate() {
        let placement = field.placement();
        let pixels = placement.project(bounds);
        println!(
            "{:>2}. {:<24} {:<28} top {:>5.1}% left {:>5.1}% size {:>5.1}%x{:<5.1}% px {}x{}+{}+{}",
            index + 1,
            field.name,
            field.fill_value,
            placement.top,
            placement.left,
            placement.width,
            placement.height,
            pixels.width,
            pixels.height,
            pixels.x,
            pixels.y,
        );
    }
    if let Some((step, total, name)) = view.step_label() {
        println!("Step {step} of {total}: {name}");
    }
}

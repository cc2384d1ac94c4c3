use crate::session::SessionNotice;

const APP_NAME: &str = "FormGuide";

pub trait Notifier {
    fn notify(&self, body: &str);
}

/// Desktop notifications through the session's notification daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) {
        send(body);
    }
}

pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname("formguide")
        .summary(APP_NAME)
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}

pub fn notice_message(notice: &SessionNotice) -> String {
    match notice {
        SessionNotice::AnalysisFailed { message } => {
            format!("Could not read the form. Please try again. ({message})")
        }
        SessionNotice::CameraUnavailable { message } => {
            format!("Camera access is needed to scan forms. ({message})")
        }
        SessionNotice::FieldsDropped { count: 1 } => {
            "1 field could not be placed on the form and was skipped.".to_string()
        }
        SessionNotice::FieldsDropped { count } => {
            format!("{count} fields could not be placed on the form and were skipped.")
        }
    }
}

pub fn notify_session(notifier: &dyn Notifier, notice: &SessionNotice) {
    notifier.notify(&notice_message(notice));
}

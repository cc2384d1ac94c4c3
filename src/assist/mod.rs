use thiserror::Error;

use crate::camera::{CameraSource, CapturedImage};
use crate::session::CaptureSession;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assistance is only available while a result is presented")]
    NoResult,
    #[error("form assistant failed: {message}")]
    Assistant { message: String },
    #[error("speech output failed: {message}")]
    Speech { message: String },
    #[error("speech recognition failed: {message}")]
    Recognition { message: String },
    #[error("no question was heard")]
    NothingHeard,
}

pub type AssistResult<T> = Result<T, AssistError>;

/// Interface languages. Each maps to the locale used for speech in and out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Bengali,
}

impl Language {
    pub const ALL: [Language; 3] = [Self::English, Self::Hindi, Self::Bengali];

    /// BCP 47 tag handed to speech engines.
    pub fn locale(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
            Self::Bengali => "bn-IN",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Bengali => "Bengali",
        }
    }

    /// Config string used in `config.json`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Bengali => "bn",
        }
    }
}

/// Parse a config string into a [`Language`]. Returns `None` for
/// unrecognised values so the caller can fall back to system detection.
pub fn parse_language(value: &str) -> Option<Language> {
    match value.trim().to_ascii_lowercase().as_str() {
        "en" | "english" | "en-us" => Some(Language::English),
        "hi" | "hindi" | "hi-in" => Some(Language::Hindi),
        "bn" | "bengali" | "bangla" | "bn-in" => Some(Language::Bengali),
        _ => None,
    }
}

fn language_from_lang_env(lang: &str) -> Language {
    match lang.split(['_', '.', '-']).next().unwrap_or("en") {
        "hi" => Language::Hindi,
        "bn" => Language::Bengali,
        _ => Language::English,
    }
}

/// Detect the language from the system `LANG` environment variable.
pub fn detect_system_language() -> Language {
    language_from_lang_env(&std::env::var("LANG").unwrap_or_default())
}

/// Resolve the effective language from an optional user config value.
pub fn resolve_language(config_value: Option<&str>) -> Language {
    config_value
        .and_then(parse_language)
        .unwrap_or_else(detect_system_language)
}

pub fn explanation_prompt(language: Language) -> String {
    format!(
        "Analyze this image of a form. Explain briefly what this form is for and what key \
         information is needed. Respond in {}. Keep it simple and under 50 words.",
        language.display_name()
    )
}

pub fn question_prompt(question: &str, language: Language) -> String {
    format!(
        "Look at this form image. Answer the following question based on the form's visible \
         content: \"{}\". Respond in {}. Keep the answer concise.",
        question.trim(),
        language.display_name()
    )
}

/// Multimodal assistant that answers a prompt about a form image.
pub trait FormAssistant {
    fn ask(&self, image: &CapturedImage, prompt: &str) -> AssistResult<String>;
}

pub trait SpeechSynthesizer {
    fn speak(&self, text: &str, locale: &str) -> AssistResult<()>;
}

pub trait SpeechRecognizer {
    /// Listens for one utterance and returns its transcript.
    fn listen(&self, locale: &str) -> AssistResult<String>;
}

fn presented_image<C: CameraSource>(session: &CaptureSession<C>) -> AssistResult<&CapturedImage> {
    if !session.phase().has_result() {
        return Err(AssistError::NoResult);
    }
    session.captured_image().ok_or(AssistError::NoResult)
}

/// Asks the assistant what the captured form is for and speaks the reply.
pub fn explain_form<C: CameraSource>(
    session: &CaptureSession<C>,
    language: Language,
    assistant: &dyn FormAssistant,
    speech: &dyn SpeechSynthesizer,
) -> AssistResult<String> {
    let image = presented_image(session)?;
    tracing::info!(capture_id = image.capture_id(), locale = language.locale(), "explaining form");
    let reply = assistant.ask(image, &explanation_prompt(language))?;
    speech.speak(&reply, language.locale())?;
    Ok(reply)
}

/// Listens for a spoken question about the captured form, then speaks the
/// assistant's answer.
pub fn answer_question<C: CameraSource>(
    session: &CaptureSession<C>,
    language: Language,
    assistant: &dyn FormAssistant,
    recognizer: &dyn SpeechRecognizer,
    speech: &dyn SpeechSynthesizer,
) -> AssistResult<String> {
    let image = presented_image(session)?;
    let question = recognizer.listen(language.locale())?;
    if question.trim().is_empty() {
        tracing::warn!("speech recognizer returned an empty transcript");
        return Err(AssistError::NothingHeard);
    }
    tracing::info!(capture_id = image.capture_id(), locale = language.locale(), "answering question");
    let reply = assistant.ask(image, &question_prompt(&question, language))?;
    speech.speak(&reply, language.locale())?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use image::DynamicImage;

    use super::*;
    use crate::camera::{CameraFacing, CameraResult};
    use crate::detect::DetectedField;
    use crate::geometry::RegionBounds;
    use crate::profile::UserProfile;
    use crate::session::{CaptureOutcome, SessionOptions};

    struct StillCamera;

    impl CameraSource for StillCamera {
        fn acquire(&mut self, _facing: CameraFacing) -> CameraResult<()> {
            Ok(())
        }

        fn current_frame(&mut self) -> CameraResult<DynamicImage> {
            Ok(DynamicImage::new_rgb8(10, 10))
        }

        fn pause(&mut self) {}

        fn resume(&mut self) {}

        fn release(&mut self) {}
    }

    #[derive(Default)]
    struct FakeAssistant {
        prompts: RefCell<Vec<String>>,
    }

    impl FormAssistant for FakeAssistant {
        fn ask(&self, image: &CapturedImage, prompt: &str) -> AssistResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(format!("reply about {}", image.capture_id()))
        }
    }

    #[derive(Default)]
    struct FakeSpeech {
        spoken: RefCell<Vec<(String, String)>>,
        heard: RefCell<Option<String>>,
    }

    impl SpeechSynthesizer for FakeSpeech {
        fn speak(&self, text: &str, locale: &str) -> AssistResult<()> {
            self.spoken
                .borrow_mut()
                .push((text.to_string(), locale.to_string()));
            Ok(())
        }
    }

    impl SpeechRecognizer for FakeSpeech {
        fn listen(&self, locale: &str) -> AssistResult<String> {
            self.spoken
                .borrow_mut()
                .push(("<listen>".to_string(), locale.to_string()));
            Ok(self.heard.borrow().clone().unwrap_or_default())
        }
    }

    fn presented_session() -> CaptureSession<StillCamera> {
        let mut session =
            CaptureSession::start(StillCamera, UserProfile::default(), SessionOptions::default());
        let CaptureOutcome::AwaitingAnalysis(request) =
            session.capture().expect("capture should work")
        else {
            panic!("expected detection request");
        };
        session
            .complete_analysis(
                request.ticket,
                Ok(vec![DetectedField::new(
                    "Name",
                    "",
                    RegionBounds::new(0.0, 0.0, 100.0, 100.0),
                )]),
            )
            .expect("analysis should apply");
        session
    }

    #[test]
    fn language_locales_match_speech_tags() {
        assert_eq!(Language::English.locale(), "en-US");
        assert_eq!(Language::Hindi.locale(), "hi-IN");
        assert_eq!(Language::Bengali.locale(), "bn-IN");
    }

    #[test]
    fn parse_language_accepts_codes_and_names() {
        assert_eq!(parse_language("hi"), Some(Language::Hindi));
        assert_eq!(parse_language("Bengali"), Some(Language::Bengali));
        assert_eq!(parse_language(" EN "), Some(Language::English));
        assert_eq!(parse_language("fr"), None);
        for language in Language::ALL {
            assert_eq!(parse_language(language.as_str()), Some(language));
        }
    }

    #[test]
    fn lang_env_maps_to_supported_language() {
        assert_eq!(language_from_lang_env("hi_IN.UTF-8"), Language::Hindi);
        assert_eq!(language_from_lang_env("bn_IN"), Language::Bengali);
        assert_eq!(language_from_lang_env("de_DE.UTF-8"), Language::English);
        assert_eq!(language_from_lang_env(""), Language::English);
    }

    #[test]
    fn resolve_language_prefers_config_value() {
        assert_eq!(resolve_language(Some("bn")), Language::Bengali);
    }

    #[test]
    fn explain_form_speaks_reply_in_active_locale() {
        let session = presented_session();
        let assistant = FakeAssistant::default();
        let speech = FakeSpeech::default();

        let reply = explain_form(&session, Language::Hindi, &assistant, &speech)
            .expect("explain should work");

        assert!(reply.starts_with("reply about capture-"));
        assert!(assistant.prompts.borrow()[0].contains("Respond in Hindi"));
        assert_eq!(
            *speech.spoken.borrow(),
            vec![(reply, "hi-IN".to_string())]
        );
    }

    #[test]
    fn answer_question_listens_then_answers() {
        let session = presented_session();
        let assistant = FakeAssistant::default();
        let speech = FakeSpeech::default();
        *speech.heard.borrow_mut() = Some("Where do I sign?".to_string());

        let reply = answer_question(&session, Language::Bengali, &assistant, &speech, &speech)
            .expect("answer should work");

        assert!(assistant.prompts.borrow()[0].contains("\"Where do I sign?\""));
        let spoken = speech.spoken.borrow();
        assert_eq!(spoken[0], ("<listen>".to_string(), "bn-IN".to_string()));
        assert_eq!(spoken[1], (reply, "bn-IN".to_string()));
    }

    #[test]
    fn answer_question_rejects_empty_transcript() {
        let session = presented_session();
        let assistant = FakeAssistant::default();
        let speech = FakeSpeech::default();

        let err = answer_question(&session, Language::English, &assistant, &speech, &speech)
            .expect_err("silence should fail");

        assert!(matches!(err, AssistError::NothingHeard));
        assert!(assistant.prompts.borrow().is_empty());
    }

    #[test]
    fn assistance_requires_presented_result() {
        let session =
            CaptureSession::start(StillCamera, UserProfile::default(), SessionOptions::default());
        let assistant = FakeAssistant::default();
        let speech = FakeSpeech::default();

        let err = explain_form(&session, Language::English, &assistant, &speech)
            .expect_err("live feed has no image to explain");

        assert!(matches!(err, AssistError::NoResult));
        assert!(speech.spoken.borrow().is_empty());
    }
}

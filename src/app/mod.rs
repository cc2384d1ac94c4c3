use crate::assist::Language;
use crate::profile::UserProfile;
use crate::storage::FormRecord;
use crate::template::Template;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashboardTab {
    #[default]
    Home,
    Documents,
    History,
    Templates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    LanguageSelect,
    Onboarding,
    Dashboard { tab: DashboardTab },
    Scanner,
}

/// Whole-application state. Never mutated in place; every change goes
/// through [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub language: Language,
    pub dark_mode: bool,
    pub profile: Option<UserProfile>,
    /// Newest first.
    pub history: Vec<FormRecord>,
    pub templates: Vec<Template>,
    /// Set only while the scanner is open on a template.
    pub selected_template: Option<Template>,
    pub view: AppView,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            language: Language::default(),
            dark_mode: false,
            profile: None,
            history: Vec::new(),
            templates: Vec::new(),
            selected_template: None,
            view: AppView::LanguageSelect,
        }
    }
}

impl AppState {
    /// State restored from persisted data. A stored profile skips the
    /// language and onboarding screens.
    pub fn restored(
        language: Language,
        profile: Option<UserProfile>,
        templates: Vec<Template>,
        history: Vec<FormRecord>,
    ) -> Self {
        let view = if profile.is_some() {
            AppView::Dashboard {
                tab: DashboardTab::Home,
            }
        } else {
            AppView::LanguageSelect
        };
        Self {
            language,
            profile,
            templates,
            history,
            view,
            ..Self::default()
        }
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SelectLanguage(Language),
    ChangeLanguage,
    SaveProfile(UserProfile),
    UpdateProfile(UserProfile),
    EditProfile,
    CancelOnboarding,
    ToggleDarkMode,
    SelectTab(DashboardTab),
    OpenScanner,
    OpenTemplate(String),
    CloseScanner,
    SaveTemplate(Template),
    CompleteScan(FormRecord),
}

fn dashboard() -> AppView {
    AppView::Dashboard {
        tab: DashboardTab::Home,
    }
}

pub fn reduce(state: AppState, action: AppAction) -> AppState {
    tracing::debug!(view = ?state.view, ?action, "reduce app action");
    match action {
        AppAction::SelectLanguage(language) => AppState {
            language,
            view: AppView::Onboarding,
            ..state
        },
        AppAction::ChangeLanguage => AppState {
            view: AppView::LanguageSelect,
            ..state
        },
        AppAction::SaveProfile(profile) => AppState {
            profile: Some(profile),
            view: dashboard(),
            ..state
        },
        AppAction::UpdateProfile(profile) => AppState {
            profile: Some(profile),
            ..state
        },
        AppAction::EditProfile => AppState {
            view: AppView::Onboarding,
            ..state
        },
        AppAction::CancelOnboarding if state.profile.is_some() => AppState {
            view: dashboard(),
            ..state
        },
        AppAction::CancelOnboarding => state,
        AppAction::ToggleDarkMode => AppState {
            dark_mode: !state.dark_mode,
            ..state
        },
        AppAction::SelectTab(tab) => match state.view {
            AppView::Dashboard { .. } => AppState {
                view: AppView::Dashboard { tab },
                ..state
            },
            _ => state,
        },
        AppAction::OpenScanner if state.profile.is_some() => AppState {
            selected_template: None,
            view: AppView::Scanner,
            ..state
        },
        AppAction::OpenTemplate(id) if state.profile.is_some() => {
            let Some(template) = state.template(&id).cloned() else {
                tracing::warn!(template_id = %id, "unknown template selected");
                return state;
            };
            AppState {
                selected_template: Some(template),
                view: AppView::Scanner,
                ..state
            }
        }
        AppAction::OpenScanner | AppAction::OpenTemplate(_) => {
            tracing::warn!("scanner requested before a profile exists");
            state
        }
        AppAction::CloseScanner => AppState {
            selected_template: None,
            view: dashboard(),
            ..state
        },
        AppAction::SaveTemplate(template) => {
            let mut templates = state.templates;
            templates.retain(|existing| existing.id != template.id);
            templates.push(template);
            AppState { templates, ..state }
        }
        AppAction::CompleteScan(record) => {
            let mut history = state.history;
            history.insert(0, record);
            AppState {
                history,
                selected_template: None,
                view: dashboard(),
                ..state
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Jane Doe".to_string(),
            ..UserProfile::default()
        }
    }

    fn template() -> Template {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        Template::new("Bank", Vec::new(), now)
    }

    fn onboarded() -> AppState {
        let state = reduce(AppState::default(), AppAction::SelectLanguage(Language::Hindi));
        reduce(state, AppAction::SaveProfile(profile()))
    }

    #[test]
    fn first_run_walks_language_then_onboarding_then_dashboard() {
        let state = AppState::default();
        assert_eq!(state.view, AppView::LanguageSelect);

        let state = reduce(state, AppAction::SelectLanguage(Language::Bengali));
        assert_eq!(state.view, AppView::Onboarding);
        assert_eq!(state.language, Language::Bengali);

        let state = reduce(state, AppAction::CancelOnboarding);
        assert_eq!(state.view, AppView::Onboarding, "no profile to fall back to");

        let state = reduce(state, AppAction::SaveProfile(profile()));
        assert_eq!(
            state.view,
            AppView::Dashboard {
                tab: DashboardTab::Home
            }
        );
        assert_eq!(state.profile, Some(profile()));
    }

    #[test]
    fn reduce_leaves_previous_state_untouched() {
        let before = onboarded();
        let after = reduce(before.clone(), AppAction::ToggleDarkMode);

        assert!(!before.dark_mode);
        assert!(after.dark_mode);
        assert!(!reduce(after, AppAction::ToggleDarkMode).dark_mode);
    }

    #[test]
    fn tabs_only_change_on_dashboard() {
        let state = reduce(onboarded(), AppAction::SelectTab(DashboardTab::History));
        assert_eq!(
            state.view,
            AppView::Dashboard {
                tab: DashboardTab::History
            }
        );

        let scanner = reduce(state, AppAction::OpenScanner);
        let unchanged = reduce(scanner.clone(), AppAction::SelectTab(DashboardTab::Templates));
        assert_eq!(unchanged, scanner);
    }

    #[test]
    fn scanner_requires_profile() {
        let state = reduce(AppState::default(), AppAction::OpenScanner);
        assert_eq!(state.view, AppView::LanguageSelect);
    }

    #[test]
    fn open_template_selects_copy_and_close_clears_it() {
        let saved = template();
        let state = reduce(onboarded(), AppAction::SaveTemplate(saved.clone()));

        let state = reduce(state, AppAction::OpenTemplate(saved.id.clone()));
        assert_eq!(state.view, AppView::Scanner);
        assert_eq!(state.selected_template, Some(saved));

        let state = reduce(state, AppAction::CloseScanner);
        assert!(state.selected_template.is_none());
        assert!(matches!(state.view, AppView::Dashboard { .. }));
    }

    #[test]
    fn unknown_template_is_ignored() {
        let state = onboarded();
        let next = reduce(state.clone(), AppAction::OpenTemplate("missing".to_string()));
        assert_eq!(next, state);
    }

    #[test]
    fn saving_same_template_twice_replaces_it() {
        let mut saved = template();
        let state = reduce(onboarded(), AppAction::SaveTemplate(saved.clone()));
        saved.name = "Bank KYC".to_string();
        let state = reduce(state, AppAction::SaveTemplate(saved.clone()));

        assert_eq!(state.templates, vec![saved]);
    }

    #[test]
    fn completed_scan_is_prepended_to_history() {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let first = FormRecord::completed(now);
        let second = FormRecord::completed(now);

        let state = reduce(onboarded(), AppAction::OpenScanner);
        let state = reduce(state, AppAction::CompleteScan(first.clone()));
        let state = reduce(state, AppAction::CompleteScan(second.clone()));

        assert_eq!(state.history, vec![second, first]);
        assert!(matches!(state.view, AppView::Dashboard { .. }));
    }

    #[test]
    fn restored_state_with_profile_opens_dashboard() {
        let state = AppState::restored(Language::English, Some(profile()), Vec::new(), Vec::new());
        assert!(matches!(state.view, AppView::Dashboard { .. }));

        let state = AppState::restored(Language::English, None, Vec::new(), Vec::new());
        assert_eq!(state.view, AppView::LanguageSelect);
    }
}

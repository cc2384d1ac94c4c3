use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::UserProfile;
use crate::template::Template;

const APP_DIR: &str = "formguide";
const PROFILE_FILE: &str = "profile.json";
const TEMPLATES_FILE: &str = "templates.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid json in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Completed,
}

/// History entry for a finished scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub status: FormStatus,
}

impl FormRecord {
    pub fn completed(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            date: now,
            status: FormStatus::Completed,
        }
    }
}

pub trait ProfileStore {
    fn load_profile(&self) -> StorageResult<Option<UserProfile>>;
    fn save_profile(&self, profile: &UserProfile) -> StorageResult<()>;
}

/// Hands out copies; stored templates are never mutated by callers.
pub trait TemplateStore {
    fn get(&self, id: &str) -> StorageResult<Option<Template>>;
    fn list_templates(&self) -> StorageResult<Vec<Template>>;
    fn insert(&self, template: Template) -> StorageResult<()>;
}

pub trait HistoryStore {
    fn record(&self, record: FormRecord) -> StorageResult<()>;
    /// Newest first.
    fn list_history(&self) -> StorageResult<Vec<FormRecord>>;
}

/// JSON-file backed stores under one data directory.
#[derive(Debug, Clone)]
pub struct StorageService {
    data_dir: PathBuf,
}

impl StorageService {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        let data_dir = default_data_dir()?;
        fs::create_dir_all(&data_dir)?;
        Ok(Self::with_data_dir(data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

impl ProfileStore for StorageService {
    fn load_profile(&self) -> StorageResult<Option<UserProfile>> {
        read_json(&self.path(PROFILE_FILE))
    }

    fn save_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        write_json(&self.path(PROFILE_FILE), profile)
    }
}

impl TemplateStore for StorageService {
    fn get(&self, id: &str) -> StorageResult<Option<Template>> {
        Ok(self
            .list_templates()?
            .into_iter()
            .find(|template| template.id == id))
    }

    fn list_templates(&self) -> StorageResult<Vec<Template>> {
        Ok(read_json(&self.path(TEMPLATES_FILE))?.unwrap_or_default())
    }

    fn insert(&self, template: Template) -> StorageResult<()> {
        let mut templates = self.list_templates()?;
        templates.retain(|existing| existing.id != template.id);
        templates.push(template);
        write_json(&self.path(TEMPLATES_FILE), &templates)
    }
}

impl HistoryStore for StorageService {
    fn record(&self, record: FormRecord) -> StorageResult<()> {
        let mut history = self.list_history()?;
        history.insert(0, record);
        write_json(&self.path(HISTORY_FILE), &history)
    }

    fn list_history(&self) -> StorageResult<Vec<FormRecord>> {
        Ok(read_json(&self.path(HISTORY_FILE))?.unwrap_or_default())
    }
}

/// In-process stores for headless use and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profile: RefCell<Option<UserProfile>>,
    templates: RefCell<Vec<Template>>,
    history: RefCell<Vec<FormRecord>>,
}

impl MemoryStore {
    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: RefCell::new(templates),
            ..Self::default()
        }
    }
}

impl ProfileStore for MemoryStore {
    fn load_profile(&self) -> StorageResult<Option<UserProfile>> {
        Ok(self.profile.borrow().clone())
    }

    fn save_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        *self.profile.borrow_mut() = Some(profile.clone());
        Ok(())
    }
}

impl TemplateStore for MemoryStore {
    fn get(&self, id: &str) -> StorageResult<Option<Template>> {
        Ok(self
            .templates
            .borrow()
            .iter()
            .find(|template| template.id == id)
            .cloned())
    }

    fn list_templates(&self) -> StorageResult<Vec<Template>> {
        Ok(self.templates.borrow().clone())
    }

    fn insert(&self, template: Template) -> StorageResult<()> {
        let mut templates = self.templates.borrow_mut();
        templates.retain(|existing| existing.id != template.id);
        templates.push(template);
        Ok(())
    }
}

impl HistoryStore for MemoryStore {
    fn record(&self, record: FormRecord) -> StorageResult<()> {
        self.history.borrow_mut().insert(0, record);
        Ok(())
    }

    fn list_history(&self) -> StorageResult<Vec<FormRecord>> {
        Ok(self.history.borrow().clone())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StorageError::Io(err)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, body)?;
    fs::rename(&staging, path)?;
    Ok(())
}

pub fn default_data_dir() -> StorageResult<PathBuf> {
    data_dir_with(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from).as_deref(),
        std::env::var_os("HOME").map(PathBuf::from).as_deref(),
    )
}

fn data_dir_with(xdg_data_home: Option<&Path>, home: Option<&Path>) -> StorageResult<PathBuf> {
    if let Some(xdg) = xdg_data_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.join(APP_DIR));
    }
    let home = home.ok_or(StorageError::MissingHomeDirectory)?;
    Ok(home.join(".local/share").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingRegion;
    use crate::overlay::Field;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn template(name: &str) -> Template {
        Template::new(
            name,
            vec![Field::new(
                "Name",
                "Jane",
                BoundingRegion::new(0.0, 0.0, 100.0, 400.0).expect("valid"),
            )],
            now(),
        )
    }

    #[test]
    fn data_dir_prefers_xdg_data_home() {
        let path = data_dir_with(Some(Path::new("/tmp/data")), Some(Path::new("/tmp/home")))
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/data/formguide"));
    }

    #[test]
    fn data_dir_falls_back_to_home_local_share() {
        let path = data_dir_with(None, Some(Path::new("/tmp/home"))).expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/home/.local/share/formguide"));
    }

    #[test]
    fn data_dir_errors_without_home() {
        let err = data_dir_with(None, None).expect_err("no home should fail");
        assert!(matches!(err, StorageError::MissingHomeDirectory));
    }

    #[test]
    fn file_store_round_trips_templates_and_replaces_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StorageService::with_data_dir(dir.path().to_path_buf());
        assert!(store.list_templates().expect("list").is_empty());

        let mut first = template("Bank");
        store.insert(first.clone()).expect("insert");
        store.insert(template("Post office")).expect("insert");

        first.name = "Bank KYC".to_string();
        store.insert(first.clone()).expect("replace");

        let templates = store.list_templates().expect("list");
        assert_eq!(templates.len(), 2);
        assert_eq!(store.get(&first.id).expect("get"), Some(first));
        assert_eq!(store.get("missing").expect("get"), None);
    }

    #[test]
    fn file_store_persists_profile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StorageService::with_data_dir(dir.path().join("nested"));
        assert_eq!(store.load_profile().expect("load"), None);

        let profile = UserProfile {
            full_name: "Jane Doe".to_string(),
            ..UserProfile::default()
        };
        store.save_profile(&profile).expect("save");

        assert_eq!(store.load_profile().expect("load"), Some(profile));
    }

    #[test]
    fn file_store_lists_history_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StorageService::with_data_dir(dir.path().to_path_buf());
        let older = FormRecord::completed(now());
        let newer = FormRecord::completed(now() + chrono::Duration::hours(1));

        store.record(older.clone()).expect("record");
        store.record(newer.clone()).expect("record");

        assert_eq!(store.list_history().expect("list"), vec![newer, older]);
    }

    #[test]
    fn file_store_reports_corrupt_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(TEMPLATES_FILE), "{not json").expect("write fixture");
        let store = StorageService::with_data_dir(dir.path().to_path_buf());

        let err = store.list_templates().expect_err("corrupt file should fail");
        assert!(matches!(err, StorageError::Json { .. }));
    }

    #[test]
    fn memory_store_hands_out_copies() {
        let store = MemoryStore::with_templates(vec![template("Bank")]);
        let id = store.list_templates().expect("list")[0].id.clone();

        let mut copy = store.get(&id).expect("get").expect("present");
        copy.fields.clear();

        let stored = store.get(&id).expect("get").expect("present");
        assert_eq!(stored.fields.len(), 1);
    }

    #[test]
    fn form_record_serializes_status_in_lowercase() {
        let record = FormRecord::completed(now());
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["status"], "completed");
    }
}

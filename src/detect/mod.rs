use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CapturedImage;
use crate::geometry::RegionBounds;
use crate::profile::UserProfile;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("form detection failed: {message}")]
    Failed { message: String },
    #[error("form detection timed out after {after:?}")]
    TimedOut { after: Duration },
    #[error("form detection returned no response")]
    EmptyResponse,
    #[error("malformed detection response")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
}

pub type DetectionResult<T> = std::result::Result<T, DetectionError>;

/// One field as reported by the detection collaborator. Bounds are not yet
/// validated; that happens when the overlay set is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedField {
    pub field_name: String,
    #[serde(default)]
    pub value_to_fill: String,
    pub bounding_box: RegionBounds,
}

impl DetectedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, bounds: RegionBounds) -> Self {
        Self {
            field_name: name.into(),
            value_to_fill: value.into(),
            bounding_box: bounds,
        }
    }
}

/// Locates writable fields on a blank form and proposes a value for each.
pub trait FormDetector: Send + Sync {
    fn detect(
        &self,
        image: &CapturedImage,
        profile: &UserProfile,
    ) -> DetectionResult<Vec<DetectedField>>;
}

/// Parses the collaborator's JSON array of `{fieldName, valueToFill, boundingBox}`.
pub fn parse_detection_response(body: &str) -> DetectionResult<Vec<DetectedField>> {
    let body = body.trim();
    if body.is_empty() {
        return Err(DetectionError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|source| DetectionError::MalformedResponse { source })
}

/// Replays a recorded collaborator response from disk.
///
/// Used by the command-line front end when no live detector is wired in.
#[derive(Debug, Clone)]
pub struct ResponseFileDetector {
    path: PathBuf,
}

impl ResponseFileDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FormDetector for ResponseFileDetector {
    fn detect(
        &self,
        image: &CapturedImage,
        _profile: &UserProfile,
    ) -> DetectionResult<Vec<DetectedField>> {
        tracing::debug!(path = %self.path.display(), capture_id = image.capture_id(), "replaying detection response");
        let body = std::fs::read_to_string(&self.path).map_err(|err| DetectionError::Failed {
            message: format!("failed to read {}: {err}", self.path.display()),
        })?;
        parse_detection_response(&body)
    }
}

use crate::assist::AssistError;
use crate::camera::CameraError;
use crate::detect::DetectionError;
use crate::geometry::RegionError;
use crate::profile::IngestError;
use crate::session::SessionError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Assist(#[from] AssistError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("usage: formguide <image-path> [template-id]")]
    Usage,
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::geometry::ImageBounds;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera not supported on this device")]
    NotSupported,
    #[error("camera device failure: {message}")]
    Device { message: String },
    #[error("camera has not been acquired")]
    NotAcquired,
    #[error("failed to read camera frame: {message}")]
    FrameUnavailable { message: String },
}

pub type CameraResult<T> = std::result::Result<T, CameraError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear camera, pointed away from the user.
    Environment,
    Any,
}

/// Platform camera capability. The capture session only ever talks to this
/// trait; adapters wrap the concrete device API.
pub trait CameraSource {
    fn acquire(&mut self, facing: CameraFacing) -> CameraResult<()>;
    fn current_frame(&mut self) -> CameraResult<DynamicImage>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn release(&mut self);
}

/// Acquires the rear camera first when preferred, then any camera.
pub fn acquire_with_fallback<C: CameraSource + ?Sized>(
    camera: &mut C,
    prefer_rear: bool,
) -> CameraResult<CameraFacing> {
    if prefer_rear {
        match camera.acquire(CameraFacing::Environment) {
            Ok(()) => return Ok(CameraFacing::Environment),
            Err(err) => {
                tracing::warn!(?err, "rear camera unavailable; trying default camera");
            }
        }
    }
    camera.acquire(CameraFacing::Any)?;
    Ok(CameraFacing::Any)
}

/// Immutable snapshot of a camera frame taken at capture time.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    capture_id: String,
    image: Arc<DynamicImage>,
    width: u32,
    height: u32,
    created_at: u64,
}

impl CapturedImage {
    pub fn snapshot(frame: DynamicImage) -> CameraResult<Self> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| CameraError::FrameUnavailable {
                message: format!("system time before unix epoch: {err}"),
            })?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CameraError::FrameUnavailable {
                message: format!("frame has no pixels ({width}x{height})"),
            });
        }

        Ok(Self {
            capture_id: format!("capture-{}", now.as_nanos()),
            image: Arc::new(frame),
            width,
            height,
            created_at: now.as_millis() as u64,
        })
    }

    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.width, self.height)
    }

    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn shares_pixels_with(&self, other: &CapturedImage) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Camera adapter that serves a single still image from disk.
#[derive(Debug)]
pub struct StillImageCamera {
    path: PathBuf,
    loaded: Option<DynamicImage>,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraSource for StillImageCamera {
    fn acquire(&mut self, _facing: CameraFacing) -> CameraResult<()> {
        let image = image::open(&self.path).map_err(|err| CameraError::Device {
            message: format!("failed to open image {}: {err}", self.path.display()),
        })?;
        self.loaded = Some(image);
        Ok(())
    }

    fn current_frame(&mut self) -> CameraResult<DynamicImage> {
        self.loaded.clone().ok_or(CameraError::NotAcquired)
    }

    // A still image has no feed to stop.
    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn release(&mut self) {
        self.loaded = None;
    }
}

/// Coordinate primitives shared by overlays, templates and presentation.
///
/// Detected regions live on a fixed 1000x1000 grid regardless of the
/// captured image's pixel size; placements are expressed as percentages of
/// whatever rectangle the presentation layer draws into.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of the normalized coordinate grid.
pub const NORMALIZED_SCALE: f64 = 1000.0;

const PERCENT_DIVISOR: f64 = NORMALIZED_SCALE / 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionBound {
    YMin,
    XMin,
    YMax,
    XMax,
}

impl RegionBound {
    pub const fn label(self) -> &'static str {
        match self {
            Self::YMin => "ymin",
            Self::XMin => "xmin",
            Self::YMax => "ymax",
            Self::XMax => "xmax",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("invalid region: {} = {value} lies outside [0, 1000]", .bound.label())]
    OutOfRange { bound: RegionBound, value: f64 },
    #[error("invalid region: {} ({min}) exceeds {} ({max})", .min_bound.label(), .max_bound.label())]
    Inverted {
        min_bound: RegionBound,
        min: f64,
        max_bound: RegionBound,
        max: f64,
    },
}

pub type RegionResult<T> = std::result::Result<T, RegionError>;

/// Unvalidated bounds exactly as a detector or a stored record reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    #[serde(rename = "ymin")]
    pub y_min: f64,
    #[serde(rename = "xmin")]
    pub x_min: f64,
    #[serde(rename = "ymax")]
    pub y_max: f64,
    #[serde(rename = "xmax")]
    pub x_max: f64,
}

impl RegionBounds {
    pub const fn new(y_min: f64, x_min: f64, y_max: f64, x_max: f64) -> Self {
        Self {
            y_min,
            x_min,
            y_max,
            x_max,
        }
    }
}

/// A validated location on the normalized grid.
///
/// Every bound lies in `[0, 1000]`, `y_min <= y_max` and `x_min <= x_max`.
/// Zero-area regions are allowed and denote point markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegionBounds", into = "RegionBounds")]
pub struct BoundingRegion {
    y_min: f64,
    x_min: f64,
    y_max: f64,
    x_max: f64,
}

impl BoundingRegion {
    pub fn new(y_min: f64, x_min: f64, y_max: f64, x_max: f64) -> RegionResult<Self> {
        Self::try_from(RegionBounds::new(y_min, x_min, y_max, x_max))
    }

    pub const fn y_min(&self) -> f64 {
        self.y_min
    }

    pub const fn x_min(&self) -> f64 {
        self.x_min
    }

    pub const fn y_max(&self) -> f64 {
        self.y_max
    }

    pub const fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn is_zero_area(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    pub fn placement(&self) -> Placement {
        Placement {
            top: self.y_min / PERCENT_DIVISOR,
            left: self.x_min / PERCENT_DIVISOR,
            width: self.width() / PERCENT_DIVISOR,
            height: self.height() / PERCENT_DIVISOR,
        }
    }
}

impl TryFrom<RegionBounds> for BoundingRegion {
    type Error = RegionError;

    fn try_from(bounds: RegionBounds) -> RegionResult<Self> {
        let checks = [
            (RegionBound::YMin, bounds.y_min),
            (RegionBound::XMin, bounds.x_min),
            (RegionBound::YMax, bounds.y_max),
            (RegionBound::XMax, bounds.x_max),
        ];
        for (bound, value) in checks {
            // NaN fails the range test as well.
            if !(0.0..=NORMALIZED_SCALE).contains(&value) {
                return Err(RegionError::OutOfRange { bound, value });
            }
        }
        if bounds.y_min > bounds.y_max {
            return Err(RegionError::Inverted {
                min_bound: RegionBound::YMin,
                min: bounds.y_min,
                max_bound: RegionBound::YMax,
                max: bounds.y_max,
            });
        }
        if bounds.x_min > bounds.x_max {
            return Err(RegionError::Inverted {
                min_bound: RegionBound::XMin,
                min: bounds.x_min,
                max_bound: RegionBound::XMax,
                max: bounds.x_max,
            });
        }

        Ok(Self {
            y_min: bounds.y_min,
            x_min: bounds.x_min,
            y_max: bounds.y_max,
            x_max: bounds.x_max,
        })
    }
}

impl From<BoundingRegion> for RegionBounds {
    fn from(region: BoundingRegion) -> Self {
        Self::new(region.y_min, region.x_min, region.y_max, region.x_max)
    }
}

/// Proportional placement in percent of the target rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn is_zero_area(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Re-projects the placement onto a concrete pixel rectangle.
    pub fn project(&self, target: ImageBounds) -> PixelRect {
        let scale_x = f64::from(target.width) / 100.0;
        let scale_y = f64::from(target.height) / 100.0;
        PixelRect {
            x: (self.left * scale_x).round() as u32,
            y: (self.top * scale_y).round() as u32,
            width: (self.width * scale_x).round() as u32,
            height: (self.height * scale_y).round() as u32,
        }
    }
}

/// Converts raw detector bounds into a placement, rejecting out-of-contract input.
pub fn normalize(bounds: RegionBounds) -> RegionResult<Placement> {
    BoundingRegion::try_from(bounds).map(|region| region.placement())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

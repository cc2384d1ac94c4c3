use serde::{Deserialize, Serialize};

use crate::camera::CapturedImage;
use crate::detect::DetectedField;
use crate::geometry::{BoundingRegion, Placement};

/// A writable spot on the form and the value the user should write there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "fieldName")]
    pub name: String,
    #[serde(rename = "valueToFill", default)]
    pub fill_value: String,
    #[serde(rename = "boundingBox")]
    pub region: BoundingRegion,
}

impl Field {
    pub fn new(name: impl Into<String>, fill_value: impl Into<String>, region: BoundingRegion) -> Self {
        Self {
            name: name.into(),
            fill_value: fill_value.into(),
            region,
        }
    }

    /// True when no profile value was found for this field.
    pub fn is_empty(&self) -> bool {
        self.fill_value.trim().is_empty()
    }

    pub fn placement(&self) -> Placement {
        self.region.placement()
    }

    pub fn with_fill_value(&self, fill_value: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            fill_value: fill_value.into(),
            region: self.region,
        }
    }
}

/// Ordered fields attached to one captured image. Never mutated after
/// construction; a new capture or template produces a new set.
#[derive(Debug, Clone)]
pub struct OverlaySet {
    image: CapturedImage,
    fields: Vec<Field>,
    dropped_fields: usize,
}

impl OverlaySet {
    pub fn new(image: CapturedImage, fields: Vec<Field>) -> Self {
        Self {
            image,
            fields,
            dropped_fields: 0,
        }
    }

    /// Builds a set from raw detector output, dropping fields whose region
    /// violates the normalized-grid contract.
    pub fn from_detection(image: CapturedImage, detected: Vec<DetectedField>) -> Self {
        let mut dropped_fields = 0;
        let fields = detected
            .into_iter()
            .filter_map(|field| match BoundingRegion::try_from(field.bounding_box) {
                Ok(region) => Some(Field::new(field.field_name, field.value_to_fill, region)),
                Err(err) => {
                    tracing::warn!(
                        capture_id = image.capture_id(),
                        field = %field.field_name,
                        %err,
                        "dropping detected field with invalid region"
                    );
                    dropped_fields += 1;
                    None
                }
            })
            .collect();

        Self {
            image,
            fields,
            dropped_fields,
        }
    }

    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    pub const fn image_width(&self) -> u32 {
        self.image.width()
    }

    pub const fn image_height(&self) -> u32 {
        self.image.height()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of detected fields rejected for invalid regions.
    pub const fn dropped_fields(&self) -> usize {
        self.dropped_fields
    }
}

impl PartialEq for OverlaySet {
    fn eq(&self, other: &Self) -> bool {
        self.image.capture_id() == other.image.capture_id()
            && self.fields == other.fields
            && self.dropped_fields == other.dropped_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RegionBounds;
    use image::DynamicImage;

    fn captured() -> CapturedImage {
        CapturedImage::snapshot(DynamicImage::new_rgb8(100, 50)).expect("snapshot")
    }

    #[test]
    fn from_detection_drops_invalid_regions_and_keeps_order() {
        let detected = vec![
            DetectedField::new("Name", "Jane", RegionBounds::new(0.0, 0.0, 100.0, 400.0)),
            DetectedField::new("Broken", "x", RegionBounds::new(0.0, 0.0, 1001.0, 10.0)),
            DetectedField::new("Inverted", "y", RegionBounds::new(50.0, 0.0, 10.0, 10.0)),
            DetectedField::new("DOB", "", RegionBounds::new(150.0, 0.0, 250.0, 400.0)),
        ];

        let set = OverlaySet::from_detection(captured(), detected);

        let names: Vec<_> = set.fields().iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "DOB"]);
        assert_eq!(set.dropped_fields(), 2);
        assert_eq!(set.image_width(), 100);
        assert_eq!(set.image_height(), 50);
    }

    #[test]
    fn from_detection_with_no_fields_is_an_empty_set() {
        let set = OverlaySet::from_detection(captured(), Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.field(0).is_none());
    }

    #[test]
    fn field_reports_empty_fill_value() {
        let region = BoundingRegion::new(0.0, 0.0, 10.0, 10.0).expect("valid");
        assert!(Field::new("Email", "", region).is_empty());
        assert!(Field::new("Email", "  ", region).is_empty());
        assert!(!Field::new("Email", "a@b.c", region).is_empty());
    }

    #[test]
    fn field_json_uses_overlay_key_names() {
        let region = BoundingRegion::new(1.0, 2.0, 3.0, 4.0).expect("valid");
        let json = serde_json::to_value(Field::new("Name", "Jane", region)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "fieldName": "Name",
                "valueToFill": "Jane",
                "boundingBox": {"ymin": 1.0, "xmin": 2.0, "ymax": 3.0, "xmax": 4.0}
            })
        );
    }
}

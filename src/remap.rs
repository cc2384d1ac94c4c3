/// Refreshes a template's stale fill values from the current profile.
///
/// Field names are matched against keyword classes by lower-cased substring,
/// in the fixed order of [`KEYWORD_PRIORITY`]; the first class that matches
/// decides the attribute. This is a heuristic: "Paid Amount" contains "id".
/// Fields that match no class keep their stored value.
use crate::camera::CapturedImage;
use crate::overlay::{Field, OverlaySet};
use crate::profile::{ProfileAttribute, UserProfile};
use crate::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordClass {
    pub attribute: ProfileAttribute,
    pub keywords: &'static [&'static str],
}

pub const KEYWORD_PRIORITY: [KeywordClass; 6] = [
    KeywordClass {
        attribute: ProfileAttribute::FullName,
        keywords: &["name"],
    },
    KeywordClass {
        attribute: ProfileAttribute::DateOfBirth,
        keywords: &["birth", "dob"],
    },
    KeywordClass {
        attribute: ProfileAttribute::Address,
        keywords: &["address"],
    },
    KeywordClass {
        attribute: ProfileAttribute::PhoneNumber,
        keywords: &["phone"],
    },
    KeywordClass {
        attribute: ProfileAttribute::IdNumber,
        keywords: &["pan", "id", "aadhar"],
    },
    KeywordClass {
        attribute: ProfileAttribute::Email,
        keywords: &["email"],
    },
];

pub fn classify_field_name(name: &str) -> Option<ProfileAttribute> {
    let key = name.to_lowercase();
    KEYWORD_PRIORITY
        .iter()
        .find(|class| class.keywords.iter().any(|keyword| key.contains(keyword)))
        .map(|class| class.attribute)
}

pub fn remap_field(field: &Field, profile: &UserProfile) -> Field {
    match classify_field_name(&field.name) {
        Some(attribute) => {
            tracing::trace!(field = %field.name, attribute = attribute.label(), "remapping field");
            field.with_fill_value(profile.attribute(attribute))
        }
        None => field.clone(),
    }
}

pub fn remap_fields(fields: &[Field], profile: &UserProfile) -> Vec<Field> {
    fields
        .iter()
        .map(|field| remap_field(field, profile))
        .collect()
}

/// Builds the overlay set for a fresh capture of a known form.
pub fn remap_template(template: &Template, profile: &UserProfile, image: CapturedImage) -> OverlaySet {
    let fields = remap_fields(&template.fields, profile);
    tracing::debug!(
        template_id = %template.id,
        capture_id = image.capture_id(),
        fields = fields.len(),
        "remapped template fields from profile"
    );
    OverlaySet::new(image, fields)
}

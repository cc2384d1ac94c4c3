use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::overlay::Field;

const DEFAULT_NAME_PREFIX: &str = "Form Template";

/// A reusable field layout captured from an earlier scan of the same form.
///
/// Fill values are whatever was current when the template was saved and are
/// stale for any later profile; run them through [`crate::remap`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "overlays")]
    pub fields: Vec<Field>,
}

impl Template {
    pub fn new(name: &str, fields: Vec<Field>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_template_id(),
            name: resolve_template_name(name, now),
            created_at: now,
            fields,
        }
    }
}

/// Trims the requested name, falling back to a dated default when blank.
pub fn resolve_template_name(requested: &str, now: DateTime<Utc>) -> String {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        format!("{DEFAULT_NAME_PREFIX} {}", now.format("%Y-%m-%d"))
    } else {
        trimmed.to_string()
    }
}

fn new_template_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

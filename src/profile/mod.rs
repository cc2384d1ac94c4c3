use serde::{Deserialize, Serialize};

mod ingest;

pub use ingest::{ingest_documents, ExtractionError, IngestError, IngestResult, ProfileExtractor};

/// Profile attributes a form field can be filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileAttribute {
    FullName,
    DateOfBirth,
    Address,
    PhoneNumber,
    Email,
    IdNumber,
}

impl ProfileAttribute {
    pub const ALL: [ProfileAttribute; 6] = [
        Self::FullName,
        Self::DateOfBirth,
        Self::Address,
        Self::PhoneNumber,
        Self::Email,
        Self::IdNumber,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::DateOfBirth => "date of birth",
            Self::Address => "address",
            Self::PhoneNumber => "phone number",
            Self::Email => "email",
            Self::IdNumber => "identity document number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    /// Identity document number (e.g. Aadhaar or PAN).
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
}

/// Attributes extracted from a single identity document. Missing or blank
/// entries mean the document did not show that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn attribute(&self, attribute: ProfileAttribute) -> &str {
        match attribute {
            ProfileAttribute::FullName => &self.full_name,
            ProfileAttribute::DateOfBirth => &self.date_of_birth,
            ProfileAttribute::Address => &self.address,
            ProfileAttribute::PhoneNumber => &self.phone_number,
            ProfileAttribute::Email => &self.email,
            ProfileAttribute::IdNumber => &self.id_number,
        }
    }

    fn attribute_mut(&mut self, attribute: ProfileAttribute) -> &mut String {
        match attribute {
            ProfileAttribute::FullName => &mut self.full_name,
            ProfileAttribute::DateOfBirth => &mut self.date_of_birth,
            ProfileAttribute::Address => &mut self.address,
            ProfileAttribute::PhoneNumber => &mut self.phone_number,
            ProfileAttribute::Email => &mut self.email,
            ProfileAttribute::IdNumber => &mut self.id_number,
        }
    }

    /// Folds one extraction result into this profile.
    ///
    /// Per attribute, a non-empty extracted value replaces the current one;
    /// a missing or blank extracted value keeps the current one.
    pub fn merge_extracted(&self, extracted: &PartialProfile) -> UserProfile {
        let mut merged = self.clone();
        for attribute in ProfileAttribute::ALL {
            if let Some(value) = extracted
                .attribute(attribute)
                .filter(|value| !value.trim().is_empty())
            {
                *merged.attribute_mut(attribute) = value.to_string();
            }
        }
        merged
    }

    pub fn with_documents(mut self, documents: impl IntoIterator<Item = UploadedDocument>) -> Self {
        self.documents.extend(documents);
        self
    }
}

impl PartialProfile {
    pub fn attribute(&self, attribute: ProfileAttribute) -> Option<&str> {
        let value = match attribute {
            ProfileAttribute::FullName => &self.full_name,
            ProfileAttribute::DateOfBirth => &self.date_of_birth,
            ProfileAttribute::Address => &self.address,
            ProfileAttribute::PhoneNumber => &self.phone_number,
            ProfileAttribute::Email => &self.email,
            ProfileAttribute::IdNumber => &self.id_number,
        };
        value.as_deref()
    }
}

use chrono::NaiveDate;
use thiserror::Error;

use super::{PartialProfile, UploadedDocument, UserProfile};
use crate::camera::CapturedImage;

#[derive(Debug, Error)]
#[error("profile extraction failed: {message}")]
pub struct ExtractionError {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no documents to ingest")]
    NoDocuments,
    #[error("document {index} could not be read")]
    Extraction {
        index: usize,
        #[source]
        source: ExtractionError,
    },
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Reads identity attributes off a photographed document.
pub trait ProfileExtractor {
    fn extract(&self, image: &CapturedImage) -> Result<PartialProfile, ExtractionError>;
}

/// Runs every document image through the extractor, folding each result into
/// the profile in order and recording one verified document per image.
///
/// All or nothing: if any extraction fails the caller keeps `profile` as is.
pub fn ingest_documents(
    profile: &UserProfile,
    kind: &str,
    images: &[CapturedImage],
    extractor: &dyn ProfileExtractor,
    today: NaiveDate,
) -> IngestResult<UserProfile> {
    if images.is_empty() {
        return Err(IngestError::NoDocuments);
    }

    let mut merged = profile.clone();
    for (index, image) in images.iter().enumerate() {
        let extracted = extractor.extract(image).map_err(|source| {
            tracing::warn!(index, capture_id = image.capture_id(), %source, "document extraction failed");
            IngestError::Extraction { index, source }
        })?;
        merged = merged.merge_extracted(&extracted);
        tracing::debug!(index, kind, capture_id = image.capture_id(), "document ingested");
    }

    let date = today.format("%Y-%m-%d").to_string();
    let documents = images.iter().map(|_| UploadedDocument {
        kind: kind.to_string(),
        date: date.clone(),
        verified: true,
    });
    Ok(merged.with_documents(documents))
}

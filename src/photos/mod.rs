//! Photo content addressing and reconciliation against stored photos.

pub mod hash;
pub mod reconciler;

use bytes::Bytes;

use crate::error::PetError;

pub use hash::{hash_bytes, hash_reader, ContentHash};
pub use reconciler::{HashedPhoto, PhotoReconciler, ReconcilePlan, Reconciliation, UploadedPhoto};

/// Mimetypes accepted for pet photos.
pub const ALLOWED_MIMETYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// A photo submitted with a create or update request.
#[derive(Debug, Clone)]
pub struct IncomingPhoto {
    pub content: Bytes,
    pub filename: String,
    pub mimetype: String,
}

impl IncomingPhoto {
    pub fn new(content: impl Into<Bytes>, filename: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            mimetype: mimetype.into(),
        }
    }
}

/// Size and type limits checked before any photo is hashed or uploaded.
#[derive(Debug, Clone)]
pub struct PhotoPolicy {
    pub max_upload_bytes: usize,
    pub allowed_mimetypes: Vec<String>,
}

impl PhotoPolicy {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self {
            max_upload_bytes,
            allowed_mimetypes: ALLOWED_MIMETYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn check(&self, photo: &IncomingPhoto) -> Result<(), PetError> {
        let reject = |reason: String| PetError::InvalidPhoto {
            filename: photo.filename.clone(),
            reason,
        };

        if photo.content.len() > self.max_upload_bytes {
            return Err(reject(format!(
                "{} bytes exceeds the {} byte limit",
                photo.content.len(),
                self.max_upload_bytes
            )));
        }

        let essence = photo
            .mimetype
            .parse::<mime::Mime>()
            .map(|m| m.essence_str().to_ascii_lowercase())
            .map_err(|_| reject(format!("unreadable mimetype {:?}", photo.mimetype)))?;

        if !self.allowed_mimetypes.iter().any(|allowed| *allowed == essence) {
            return Err(reject(format!("mimetype {} is not accepted", essence)));
        }

        Ok(())
    }

    pub fn check_all(&self, photos: &[IncomingPhoto]) -> Result<(), PetError> {
        photos.iter().try_for_each(|p| self.check(p))
    }
}

impl Default for PhotoPolicy {
    fn default() -> Self {
        Self::new(5 * 1024 * 1024)
    }
}

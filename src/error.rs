use sea_orm::DbErr;

use crate::storage::StorageError;

/// Failures of the pet and photo lifecycle operations.
///
/// Callers match on the variant to decide how to surface the failure; the
/// library never formats user-facing responses itself.
#[derive(Debug, thiserror::Error)]
pub enum PetError {
    #[error("organization not found")]
    OrgNotFound,
    #[error("pet not found")]
    PetNotFound,
    #[error("an organization with this email already exists")]
    EmailTaken,
    #[error("organization does not own this pet")]
    Unauthorized,
    /// A photo upload failed. Blobs uploaded earlier in the same batch are
    /// left in storage unreferenced.
    #[error("failed to upload photo {filename}")]
    UploadFailure {
        filename: String,
        #[source]
        source: StorageError,
    },
    /// A stored photo could not be removed after all uploads succeeded.
    #[error("failed to remove stored photo {key}")]
    RemovalFailure {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("photo {filename} rejected: {reason}")]
    InvalidPhoto { filename: String, reason: String },
    #[error("failed to read photo {filename}")]
    Hashing {
        filename: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Errors reported by a [`BlobStore`](super::BlobStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The backend rejected or failed the request.
    #[error("storage backend error: {0}")]
    Backend(String),
}

//! Durable object storage for pet photos.

mod error;

pub mod gcs;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

pub use error::StorageError;
pub use gcs::GcsBlobStore;
pub use memory::InMemoryBlobStore;

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Publicly resolvable location of the object.
    pub url: String,
    /// Backend identifier used for deletion. Some backends do not report one.
    pub key: Option<String>,
}

/// Object storage backend for photo content.
///
/// Implementations do not enforce size or mimetype limits; callers validate
/// content before uploading.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under a name derived from `owner_id`, the current time
    /// and `filename`.
    async fn upload(
        &self,
        owner_id: Uuid,
        content: Bytes,
        filename: &str,
        mimetype: &str,
    ) -> Result<StoredBlob, StorageError>;

    /// Delete an object by key.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Object name for an upload: `{owner}-{unix millis}-{basename}`.
pub fn object_name(owner_id: Uuid, timestamp_millis: i64, filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("photo");
    format!("{}-{}-{}", owner_id, timestamp_millis, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_strips_directories() {
        let owner = Uuid::nil();
        assert_eq!(
            object_name(owner, 42, "/tmp/uploads/rex.png"),
            format!("{}-42-rex.png", owner)
        );
    }

    #[test]
    fn object_name_falls_back_for_empty_filename() {
        let owner = Uuid::nil();
        assert_eq!(object_name(owner, 7, ""), format!("{}-7-photo", owner));
    }
}

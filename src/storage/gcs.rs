use async_trait::async_trait;
use bytes::Bytes;
use google_cloud_storage::client::Client as GcsClient;
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use google_cloud_storage::http::Error as GcsError;
use uuid::Uuid;

use super::{object_name, BlobStore, StorageError, StoredBlob};

/// Google Cloud Storage backend.
#[derive(Clone)]
pub struct GcsBlobStore {
    client: GcsClient,
    bucket: String,
    public_base_url: String,
}

impl GcsBlobStore {
    pub fn new(client: GcsClient, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, object: &str) -> String {
        format!("{}/{}", self.public_base_url, object)
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn upload(
        &self,
        owner_id: Uuid,
        content: Bytes,
        filename: &str,
        mimetype: &str,
    ) -> Result<StoredBlob, StorageError> {
        let object = object_name(owner_id, chrono::Utc::now().timestamp_millis(), filename);

        let upload_type = UploadType::Simple(Media {
            name: object.clone().into(),
            content_type: mimetype.to_string().into(),
            content_length: Some(content.len() as u64),
        });

        let uploaded = self
            .client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                content,
                &upload_type,
            )
            .await
            .map_err(|e| StorageError::Backend(format!("GCS upload of {} failed: {}", object, e)))?;

        tracing::debug!(bucket = %self.bucket, object = %uploaded.name, "uploaded photo object");

        Ok(StoredBlob {
            url: self.public_url(&uploaded.name),
            key: Some(uploaded.name),
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            object: key.to_string(),
            ..Default::default()
        };

        match self.client.delete_object(&request).await {
            Ok(()) => Ok(()),
            Err(GcsError::Response(e)) if e.code == 404 => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Backend(format!("GCS delete of {} failed: {}", key, e))),
        }
    }
}

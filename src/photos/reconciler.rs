use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::Instrument;
use uuid::Uuid;

use super::hash::{hash_bytes, ContentHash};
use super::IncomingPhoto;
use crate::entities::photo;
use crate::error::PetError;
use crate::repositories::PhotoIndex;
use crate::storage::BlobStore;

/// An incoming photo together with its content digest.
#[derive(Debug, Clone)]
pub struct HashedPhoto {
    pub hash: ContentHash,
    pub photo: IncomingPhoto,
}

/// A photo whose upload the blob store confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPhoto {
    pub hash: ContentHash,
    pub url: String,
    pub key: Option<String>,
}

/// Hash-based split of incoming photos against the stored set.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Incoming content not stored yet, one entry per distinct hash.
    pub to_upload: Vec<HashedPhoto>,
    /// Stored photos that are still submitted.
    pub to_keep: Vec<photo::Model>,
    /// Stored photos that are no longer submitted.
    pub to_remove: Vec<photo::Model>,
}

impl ReconcilePlan {
    /// Compare by hash only. Filenames and mimetypes never matter, and
    /// repeated submissions of the same content collapse into the first one.
    pub fn partition(existing: Vec<photo::Model>, incoming: Vec<HashedPhoto>) -> Self {
        let incoming_hashes: HashSet<String> = incoming.iter().map(|p| p.hash.to_hex()).collect();
        let existing_hashes: HashSet<String> = existing
            .iter()
            .map(|p| p.hash.to_ascii_lowercase())
            .collect();

        let mut seen = HashSet::new();
        let to_upload = incoming
            .into_iter()
            .filter(|p| {
                let hex = p.hash.to_hex();
                !existing_hashes.contains(&hex) && seen.insert(hex)
            })
            .collect();

        let (to_keep, to_remove) = existing
            .into_iter()
            .partition(|p| incoming_hashes.contains(&p.hash.to_ascii_lowercase()));

        Self {
            to_upload,
            to_keep,
            to_remove,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.to_upload.is_empty() && self.to_remove.is_empty()
    }
}

/// Outcome of a successful reconciliation: blobs are uploaded and removed,
/// the photo index is not touched yet.
#[derive(Debug)]
#[must_use = "photo rows are only written by `commit`"]
pub struct Reconciliation {
    pub kept: Vec<photo::Model>,
    pub uploaded: Vec<UploadedPhoto>,
    pub removed: Vec<photo::Model>,
}

impl Reconciliation {
    /// Record the outcome in the photo index for `pet_id` and return the
    /// pet's final photo set.
    ///
    /// New rows are inserted in one batch. Rows of removed photos are then
    /// deleted best-effort: their blobs are already gone, so a failed row
    /// deletion is logged and counted but does not fail the operation. The
    /// deletions are attempted even when the batch insert failed; that
    /// failure is returned afterwards.
    pub async fn commit(self, pet_id: Uuid, index: &dyn PhotoIndex) -> Result<Vec<photo::Model>, PetError> {
        let now = chrono::Utc::now().naive_utc();
        let created: Vec<photo::Model> = self
            .uploaded
            .into_iter()
            .map(|uploaded| photo::Model {
                id: Uuid::new_v4(),
                hash: uploaded.hash.to_hex(),
                url: uploaded.url,
                key: uploaded.key,
                pet_id,
                created_at: now,
            })
            .collect();

        let inserted = if created.is_empty() {
            Ok(0)
        } else {
            index.create_many(created.clone()).await
        };
        if let Err(e) = &inserted {
            tracing::error!(%pet_id, count = created.len(), "failed to record new photos: {}", e);
        }

        let deletions = self.removed.iter().map(|p| async move { (p, index.delete(p.id).await) });
        let mut deleted = 0u64;
        for (removed, result) in join_all(deletions).await {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        %pet_id,
                        photo_id = %removed.id,
                        key = removed.storage_key(),
                        "failed to delete photo row after its blob was removed: {}",
                        e
                    );
                    metrics::counter!("adopto_photo_index_delete_failures_total").increment(1);
                }
            }
        }
        metrics::gauge!("adopto_photos_total").decrement(deleted as f64);

        let count = inserted?;
        tracing::debug!(%pet_id, count, "recorded new photos");
        metrics::gauge!("adopto_photos_total").increment(count as f64);

        let mut photos = self.kept;
        photos.extend(created);
        Ok(photos)
    }
}

/// Brings a pet's stored photos in line with a newly submitted set.
#[derive(Clone)]
pub struct PhotoReconciler {
    blob_store: Arc<dyn BlobStore>,
}

impl PhotoReconciler {
    pub fn new(blob_store: Arc<dyn BlobStore>) -> Self {
        Self { blob_store }
    }

    /// Hash every photo concurrently.
    pub async fn hash_all(incoming: Vec<IncomingPhoto>) -> Result<Vec<HashedPhoto>, PetError> {
        try_join_all(incoming.into_iter().map(|photo| async move {
            let hash = hash_bytes(&photo.content)
                .await
                .map_err(|source| PetError::Hashing {
                    filename: photo.filename.clone(),
                    source,
                })?;
            Ok::<_, PetError>(HashedPhoto { hash, photo })
        }))
        .await
    }

    /// Upload new content and remove dropped content for `owner_id`.
    ///
    /// Removals only start once every upload is confirmed, so a failed upload
    /// never costs an existing photo. Neither step is rolled back on failure:
    /// blobs uploaded before an error stay in storage unreferenced.
    pub async fn reconcile(
        &self,
        owner_id: Uuid,
        existing: Vec<photo::Model>,
        incoming: Vec<IncomingPhoto>,
    ) -> Result<Reconciliation, PetError> {
        let span = tracing::info_span!("reconcile_photos", pet_id = %owner_id);
        async move {
            let started = std::time::Instant::now();

            let hashed = Self::hash_all(incoming).await?;
            let plan = ReconcilePlan::partition(existing, hashed);
            tracing::debug!(
                upload = plan.to_upload.len(),
                keep = plan.to_keep.len(),
                remove = plan.to_remove.len(),
                "photo plan computed"
            );

            let uploaded = self.upload_all(owner_id, plan.to_upload).await?;
            self.remove_all(&plan.to_remove).await?;

            metrics::histogram!("adopto_photo_reconcile_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            Ok(Reconciliation {
                kept: plan.to_keep,
                uploaded,
                removed: plan.to_remove,
            })
        }
        .instrument(span)
        .await
    }

    async fn upload_all(&self, owner_id: Uuid, photos: Vec<HashedPhoto>) -> Result<Vec<UploadedPhoto>, PetError> {
        let store = &self.blob_store;
        let uploaded = try_join_all(photos.into_iter().map(|HashedPhoto { hash, photo }| async move {
            let stored = store
                .upload(owner_id, photo.content, &photo.filename, &photo.mimetype)
                .await
                .map_err(|source| {
                    tracing::error!(filename = %photo.filename, "photo upload failed: {}", source);
                    PetError::UploadFailure {
                        filename: photo.filename.clone(),
                        source,
                    }
                })?;
            Ok::<_, PetError>(UploadedPhoto {
                hash,
                url: stored.url,
                key: stored.key,
            })
        }))
        .await?;

        metrics::counter!("adopto_photo_uploads_total").increment(uploaded.len() as u64);
        Ok(uploaded)
    }

    async fn remove_all(&self, photos: &[photo::Model]) -> Result<(), PetError> {
        let store = &self.blob_store;
        try_join_all(photos.iter().map(|p| async move {
            let key = p.storage_key();
            store.remove(key).await.map_err(|source| {
                tracing::error!(photo_id = %p.id, key, "photo removal failed: {}", source);
                PetError::RemovalFailure {
                    key: key.to_string(),
                    source,
                }
            })
        }))
        .await?;

        metrics::counter!("adopto_photo_removals_total").increment(photos.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hashed(content: &'static [u8], filename: &str) -> HashedPhoto {
        let photo = IncomingPhoto::new(content, filename, "image/png");
        let hash = hash_bytes(&photo.content).await.unwrap();
        HashedPhoto { hash, photo }
    }

    async fn stored(content: &'static [u8]) -> photo::Model {
        let hash = hash_bytes(&bytes::Bytes::from_static(content)).await.unwrap();
        photo::Model {
            id: Uuid::new_v4(),
            hash: hash.to_hex(),
            url: format!("memory://photos/{}", hash),
            key: Some(hash.to_hex()),
            pet_id: Uuid::nil(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn duplicates_collapse_to_first_submission() {
        let plan = ReconcilePlan::partition(
            vec![],
            vec![hashed(b"same", "first.png").await, hashed(b"same", "second.png").await],
        );
        assert_eq!(plan.to_upload.len(), 1);
        assert_eq!(plan.to_upload[0].photo.filename, "first.png");
    }

    #[tokio::test]
    async fn identical_sets_are_a_noop() {
        let existing = vec![stored(b"a").await, stored(b"b").await];
        let plan = ReconcilePlan::partition(
            existing,
            vec![hashed(b"b", "renamed.jpg").await, hashed(b"a", "x.png").await],
        );
        assert!(plan.is_noop());
        assert_eq!(plan.to_keep.len(), 2);
    }

    #[tokio::test]
    async fn swap_partitions_each_side() {
        let a = stored(b"a").await;
        let b = stored(b"b").await;
        let plan = ReconcilePlan::partition(
            vec![a.clone(), b.clone()],
            vec![hashed(b"a", "a.png").await, hashed(b"c", "c.png").await],
        );
        assert_eq!(plan.to_keep, vec![a]);
        assert_eq!(plan.to_remove, vec![b]);
        assert_eq!(plan.to_upload.len(), 1);
        assert_eq!(plan.to_upload[0].photo.filename, "c.png");
    }

    #[tokio::test]
    async fn stored_hash_case_is_ignored() {
        let mut a = stored(b"a").await;
        a.hash = a.hash.to_ascii_uppercase();
        let plan = ReconcilePlan::partition(vec![a], vec![hashed(b"a", "a.png").await]);
        assert!(plan.is_noop());
    }

    #[tokio::test]
    async fn empty_incoming_removes_everything() {
        let plan = ReconcilePlan::partition(vec![stored(b"a").await], vec![]);
        assert!(plan.to_upload.is_empty());
        assert!(plan.to_keep.is_empty());
        assert_eq!(plan.to_remove.len(), 1);
    }
}

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use adopto_server::entities::photo;
use adopto_server::error::PetError;
use adopto_server::photos::{hash_bytes, IncomingPhoto, PhotoReconciler};
use adopto_server::repositories::{InMemoryPhotoIndex, PhotoIndex};
use adopto_server::storage::{InMemoryBlobStore, StorageError};
use bytes::Bytes;
use common::photo;
use uuid::Uuid;

struct Fixture {
    pet_id: Uuid,
    store: Arc<InMemoryBlobStore>,
    index: Arc<InMemoryPhotoIndex>,
    reconciler: PhotoReconciler,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryBlobStore::new());
        Self {
            pet_id: Uuid::new_v4(),
            reconciler: PhotoReconciler::new(store.clone()),
            store,
            index: Arc::new(InMemoryPhotoIndex::new()),
        }
    }

    async fn stored(&self) -> Vec<photo::Model> {
        self.index.get_many_by_pet_id(self.pet_id).await.unwrap()
    }

    async fn submit(&self, incoming: Vec<IncomingPhoto>) -> Result<Vec<photo::Model>, PetError> {
        let existing = self.stored().await;
        let reconciliation = self.reconciler.reconcile(self.pet_id, existing, incoming).await?;
        reconciliation.commit(self.pet_id, self.index.as_ref()).await
    }
}

async fn hex(content: &'static [u8]) -> String {
    hash_bytes(&Bytes::from_static(content)).await.unwrap().to_hex()
}

fn hashes(photos: &[photo::Model]) -> HashSet<String> {
    photos.iter().map(|p| p.hash.clone()).collect()
}

#[tokio::test]
async fn duplicate_submissions_are_stored_once() {
    let fx = Fixture::new();

    let photos = fx
        .submit(vec![photo(b"a", "first.png"), photo(b"a", "second.png"), photo(b"b", "b.png")])
        .await
        .unwrap();

    assert_eq!(photos.len(), 2);
    assert_eq!(fx.store.upload_calls(), 2);
    assert_eq!(fx.store.len().await, 2);
    assert_eq!(fx.stored().await.len(), 2);

    let a = hex(b"a").await;
    let first = photos.iter().find(|p| p.hash == a).unwrap();
    assert!(first.url.ends_with("first.png"));
}

#[tokio::test]
async fn resubmitting_the_same_content_is_a_noop() {
    let fx = Fixture::new();
    let before = fx.submit(vec![photo(b"a", "a.png"), photo(b"b", "b.png")]).await.unwrap();

    let after = fx
        .submit(vec![photo(b"b", "renamed.jpg"), photo(b"a", "other.png")])
        .await
        .unwrap();

    assert_eq!(fx.store.upload_calls(), 2);
    assert_eq!(fx.store.remove_calls(), 0);
    assert_eq!(hashes(&before), hashes(&after));

    let ids: HashSet<Uuid> = fx.stored().await.iter().map(|p| p.id).collect();
    assert_eq!(ids, before.iter().map(|p| p.id).collect());
}

#[tokio::test]
async fn adding_a_photo_keeps_the_existing_ones() {
    let fx = Fixture::new();
    fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();

    let photos = fx.submit(vec![photo(b"a", "a.png"), photo(b"b", "b.png")]).await.unwrap();

    assert_eq!(fx.store.upload_calls(), 2);
    assert_eq!(fx.store.remove_calls(), 0);
    assert_eq!(hashes(&photos), HashSet::from([hex(b"a").await, hex(b"b").await]));
}

#[tokio::test]
async fn dropping_a_photo_removes_blob_and_row() {
    let fx = Fixture::new();
    let seeded = fx.submit(vec![photo(b"a", "a.png"), photo(b"b", "b.png")]).await.unwrap();
    let b_key = seeded
        .iter()
        .find(|p| p.url.ends_with("b.png"))
        .map(|p| p.storage_key().to_string())
        .unwrap();

    let photos = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();

    assert_eq!(fx.store.upload_calls(), 2);
    assert_eq!(fx.store.remove_calls(), 1);
    assert!(!fx.store.contains(&b_key).await);
    assert_eq!(hashes(&photos), HashSet::from([hex(b"a").await]));
    assert_eq!(hashes(&fx.stored().await), HashSet::from([hex(b"a").await]));
}

#[tokio::test]
async fn swapping_a_photo_uploads_and_removes_one_each() {
    let fx = Fixture::new();
    fx.submit(vec![photo(b"a", "a.png"), photo(b"b", "b.png")]).await.unwrap();

    let photos = fx.submit(vec![photo(b"a", "a.png"), photo(b"c", "c.png")]).await.unwrap();

    assert_eq!(fx.store.upload_calls(), 3);
    assert_eq!(fx.store.remove_calls(), 1);
    let expected = HashSet::from([hex(b"a").await, hex(b"c").await]);
    assert_eq!(hashes(&photos), expected);
    assert_eq!(hashes(&fx.stored().await), expected);
    assert_eq!(fx.store.len().await, 2);
}

#[tokio::test]
async fn failed_upload_leaves_existing_photos_untouched() {
    let fx = Fixture::new();
    let seeded = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();
    fx.store.fail_upload_of("c.png").await;

    let err = fx
        .submit(vec![photo(b"c", "c.png"), photo(b"d", "d.png")])
        .await
        .unwrap_err();

    assert!(matches!(err, PetError::UploadFailure { ref filename, .. } if filename == "c.png"));
    assert_eq!(fx.store.remove_calls(), 0);
    assert!(fx.store.contains(seeded[0].storage_key()).await);
    assert_eq!(fx.stored().await, seeded);
}

#[tokio::test]
async fn failed_removal_records_no_new_rows() {
    let fx = Fixture::new();
    let seeded = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();
    fx.store.fail_removals(true);

    let err = fx.submit(vec![photo(b"b", "b.png")]).await.unwrap_err();

    assert!(matches!(err, PetError::RemovalFailure { .. }));
    assert_eq!(fx.stored().await, seeded);
    // The new blob was uploaded before the removal failed and stays orphaned.
    assert_eq!(fx.store.len().await, 2);
}

#[tokio::test]
async fn removing_a_missing_blob_is_a_removal_failure() {
    let fx = Fixture::new();
    let seeded = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();
    let key = seeded[0].storage_key().to_string();
    adopto_server::storage::BlobStore::remove(fx.store.as_ref(), &key)
        .await
        .unwrap();

    let err = fx.submit(vec![]).await.unwrap_err();

    match err {
        PetError::RemovalFailure { key: failed, source } => {
            assert_eq!(failed, key);
            assert!(matches!(source, StorageError::NotFound(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_row_deletion_does_not_fail_the_reconciliation() {
    let fx = Fixture::new();
    let seeded = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();
    fx.index.fail_delete(true);

    let photos = fx.submit(vec![photo(b"b", "b.png")]).await.unwrap();

    assert_eq!(hashes(&photos), HashSet::from([hex(b"b").await]));
    assert!(!fx.store.contains(seeded[0].storage_key()).await);
    // The stale row outlives its blob.
    assert_eq!(fx.stored().await.len(), 2);
}

#[tokio::test]
async fn keyless_photos_are_removed_by_their_url() {
    let fx = Fixture::new();
    fx.store.omit_keys(true);
    let seeded = fx.submit(vec![photo(b"a", "a.png")]).await.unwrap();
    assert_eq!(seeded[0].key, None);

    let photos = fx.submit(vec![]).await.unwrap();

    assert!(photos.is_empty());
    assert!(fx.store.is_empty().await);
    assert!(fx.stored().await.is_empty());
}

#[tokio::test]
async fn failed_batch_insert_still_drops_rows_of_removed_blobs() {
    let fx = Fixture::new();
    fx.submit(vec![photo(b"a", "a.png"), photo(b"b", "b.png")]).await.unwrap();
    fx.index.fail_create_many(true);

    let err = fx
        .submit(vec![photo(b"a", "a.png"), photo(b"c", "c.png")])
        .await
        .unwrap_err();

    assert!(matches!(err, PetError::Database(_)));
    let rows = fx.stored().await;
    assert_eq!(hashes(&rows), HashSet::from([hex(b"a").await]));
    for row in &rows {
        assert!(fx.store.contains(row.storage_key()).await);
    }
}

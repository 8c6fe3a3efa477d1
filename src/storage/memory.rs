use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{object_name, BlobStore, StorageError, StoredBlob};

/// Process-local blob store with switchable failures, for tests and local
/// development.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failing_filenames: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
    fail_removals: AtomicBool,
    omit_keys: AtomicBool,
    upload_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    clock: AtomicI64,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make uploads of this filename fail while others succeed.
    pub async fn fail_upload_of(&self, filename: &str) {
        self.failing_filenames.lock().await.insert(filename.to_string());
    }

    /// Make every subsequent removal fail.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// Report uploads without a key, like backends that only return a url.
    pub fn omit_keys(&self, omit: bool) {
        self.omit_keys.store(omit, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    /// Place an object directly, bypassing counters and failure flags.
    pub async fn insert(&self, key: &str, content: Bytes) {
        self.objects.lock().await.insert(key.to_string(), content);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        owner_id: Uuid,
        content: Bytes,
        filename: &str,
        _mimetype: &str,
    ) -> Result<StoredBlob, StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_uploads.load(Ordering::SeqCst)
            || self.failing_filenames.lock().await.contains(filename)
        {
            return Err(StorageError::Backend(format!("upload of {} refused", filename)));
        }

        // Monotonic fake clock keeps same-named uploads apart.
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let key = object_name(owner_id, tick, filename);
        self.objects.lock().await.insert(key.clone(), content);

        Ok(StoredBlob {
            url: format!("memory://photos/{}", key),
            key: if self.omit_keys.load(Ordering::SeqCst) {
                None
            } else {
                Some(key)
            },
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("removal of {} refused", key)));
        }

        match self.objects.lock().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}

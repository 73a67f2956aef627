//! In-memory object store (HashMap storage) for tests and embedding

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ObjectStore, OriginObject, StorageError};

/// Object store keeping `(bucket, key)` → object in memory
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), OriginObject>>>,
    requests: Arc<RwLock<Vec<(String, String)>>>,
    /// Simulate a backend failure with this error if set
    failure: Arc<RwLock<Option<StorageError>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, object: OriginObject) {
        self.objects
            .write()
            .insert((bucket.to_string(), key.to_string()), object);
    }

    /// Make every subsequent fetch fail with `error`
    pub fn set_failure(&self, error: Option<StorageError>) {
        *self.failure.write() = error;
    }

    /// Every `(bucket, key)` requested so far, in order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<OriginObject, StorageError> {
        self.requests
            .write()
            .push((bucket.to_string(), key.to_string()));

        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }

        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::no_such_key(key))
    }
}

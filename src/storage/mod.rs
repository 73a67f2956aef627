//! Object storage collaborator
//!
//! The pipeline only needs `get_object`; the S3 implementation backs the
//! binary and the in-memory one backs tests and local runs.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// Error code storage reports for a missing key
pub const NO_SUCH_KEY: &str = "NoSuchKey";

/// Object body plus the metadata the pipeline forwards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl OriginObject {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// Failure reported by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StorageError {
    /// Backend error code, e.g. `NoSuchKey`, `AccessDenied`
    pub code: String,
    pub message: String,
    /// HTTP status the backend answered with, if it got that far
    pub status: Option<u16>,
}

impl StorageError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn no_such_key(key: &str) -> Self {
        Self::new(NO_SUCH_KEY, format!("The specified key does not exist: {}", key))
            .with_status(404)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == NO_SUCH_KEY
    }
}

/// Read access to source objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes and metadata
    async fn get_object(&self, bucket: &str, key: &str) -> Result<OriginObject, StorageError>;
}

//! Origin image retrieval with the per-directory `default.jpg` fallback

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::content_type::sniff_content_type;
use crate::constants::{
    DEFAULT_CACHE_CONTROL, FALLBACK_CONTENT_TYPE, FALLBACK_IMAGE_NAME, GENERIC_CONTENT_TYPES,
    HTTP_DATE_FORMAT,
};
use crate::error::ImageRequestError;
use crate::storage::{ObjectStore, OriginObject, StorageError};

/// Fetched original plus the response metadata derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct OriginImage {
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
    pub expires: Option<String>,
    pub last_modified: Option<String>,
}

/// Fetch `bucket/key`, retrying once at the directory's `default.jpg`
/// when the key is missing.
pub async fn fetch_origin(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<OriginImage, ImageRequestError> {
    let object = match store.get_object(bucket, key).await {
        Ok(object) => object,
        Err(err) if err.is_not_found() => {
            let fallback_key = fallback_key(key);
            tracing::info!(
                bucket = %bucket,
                key = %key,
                fallback_key = %fallback_key,
                "Original not found, trying fallback image"
            );
            store
                .get_object(bucket, &fallback_key)
                .await
                .map_err(|err| {
                    tracing::warn!(bucket = %bucket, key = %fallback_key, code = %err.code, "Fallback image fetch failed");
                    ImageRequestError::no_such_key(err.message)
                })?
        }
        Err(err) => return Err(storage_failure(bucket, key, err)),
    };

    describe(object)
}

/// `a/b/c.jpg` → `a/b/default.jpg`; `c.jpg` → `default.jpg`
pub fn fallback_key(key: &str) -> String {
    match key.rfind('/') {
        Some(idx) => format!("{}{}", &key[..=idx], FALLBACK_IMAGE_NAME),
        None => FALLBACK_IMAGE_NAME.to_string(),
    }
}

fn storage_failure(bucket: &str, key: &str, err: StorageError) -> ImageRequestError {
    tracing::error!(
        bucket = %bucket,
        key = %key,
        code = %err.code,
        status = ?err.status,
        "Object fetch failed"
    );
    ImageRequestError::storage_failure(err.code, err.message)
}

fn describe(object: OriginObject) -> Result<OriginImage, ImageRequestError> {
    let content_type = match object.content_type.as_deref() {
        Some(reported) if GENERIC_CONTENT_TYPES.contains(&reported) => {
            sniff_content_type(&object.body)?.to_string()
        }
        Some(reported) => reported.to_string(),
        None => FALLBACK_CONTENT_TYPE.to_string(),
    };

    Ok(OriginImage {
        content_type,
        cache_control: object
            .cache_control
            .unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
        expires: object.expires.map(http_date),
        last_modified: object.last_modified.map(http_date),
        body: object.body,
    })
}

fn http_date(value: DateTime<Utc>) -> String {
    value.format(HTTP_DATE_FORMAT).to_string()
}

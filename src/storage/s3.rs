//! S3-backed object store

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

use super::{ObjectStore, OriginObject, StorageError};

/// Object store reading through an AWS SDK S3 client
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the shared AWS configuration
    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(S3Client::new(config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<OriginObject, StorageError> {
        tracing::debug!(bucket = %bucket, key = %key, "Fetching object from S3");

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let service_error = e.into_service_error();
                let error = if service_error.is_no_such_key() {
                    StorageError::no_such_key(key)
                } else {
                    StorageError::new(
                        service_error.code().unwrap_or("InternalError"),
                        service_error
                            .message()
                            .map(str::to_string)
                            .unwrap_or_else(|| service_error.to_string()),
                    )
                };
                match status {
                    Some(status) => error.with_status(status),
                    None => error,
                }
            })?;

        let content_type = response.content_type().map(str::to_string);
        let cache_control = response.cache_control().map(str::to_string);
        let expires = response.expires_string().and_then(parse_http_date);
        let last_modified = response.last_modified().and_then(to_chrono);

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::new("InternalError", format!("Failed to read S3 body: {e}")))?
            .into_bytes();

        Ok(OriginObject {
            body,
            content_type,
            cache_control,
            expires,
            last_modified,
        })
    }
}

fn to_chrono(value: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

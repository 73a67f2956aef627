//! Request signature validation
//!
//! A signed request carries `signature=<hex>` in its query string, where the
//! value is HMAC-SHA256 over the raw request path keyed by a field of a JSON
//! secret.

pub mod secrets;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

pub use secrets::{SecretError, SecretProvider, SecretsManagerProvider, StaticSecretProvider};

use crate::config::SignatureConfig;
use crate::error::{ErrorKind, ImageRequestError};

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the signature
pub const SIGNATURE_PARAM: &str = "signature";

/// Check the request signature when signing is enabled
///
/// A mismatch surfaces as `SignatureDoesNotMatch`; every other failure
/// (secret lookup, malformed secret, missing key field) collapses into
/// `SignatureValidationFailure`.
pub async fn validate_signature(
    path: &str,
    query: Option<&HashMap<String, String>>,
    config: &SignatureConfig,
    secrets: &dyn SecretProvider,
) -> Result<(), ImageRequestError> {
    if !config.enabled {
        return Ok(());
    }

    let signature = query
        .and_then(|q| q.get(SIGNATURE_PARAM))
        .ok_or_else(ImageRequestError::missing_signature)?;

    match verify(path, signature, config, secrets).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_signature_mismatch() => {
            tracing::warn!(path = %path, "Signature does not match");
            Err(err)
        }
        Err(err) => {
            tracing::error!(code = %err.code, message = %err.message, "Signature validation failed");
            Err(ImageRequestError::signature_validation_failure())
        }
    }
}

async fn verify(
    path: &str,
    signature: &str,
    config: &SignatureConfig,
    secrets: &dyn SecretProvider,
) -> Result<(), ImageRequestError> {
    let secret = secrets
        .get_secret(&config.secret_source_id)
        .await
        .map_err(|e| internal("SecretRetrievalFailure", e.to_string()))?;

    let key = signing_key(&secret, &config.secret_key_field)?;
    let expected = generate_signature(path, &key)?;

    if constant_time_compare(signature, &expected) {
        Ok(())
    } else {
        Err(ImageRequestError::signature_mismatch())
    }
}

fn signing_key(secret: &str, field: &str) -> Result<String, ImageRequestError> {
    let document: serde_json::Value = serde_json::from_str(secret)
        .map_err(|e| internal("MalformedSecret", e.to_string()))?;

    document
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| internal("MissingSecretKey", format!("Secret has no string field '{}'", field)))
}

/// Hex-encoded HMAC-SHA256 of `path` keyed by `key`
pub fn generate_signature(path: &str, key: &str) -> Result<String, ImageRequestError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| internal("InvalidSigningKey", e.to_string()))?;
    mac.update(path.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn internal(code: &str, message: String) -> ImageRequestError {
    ImageRequestError::new(ErrorKind::InternalServerError, code, message)
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

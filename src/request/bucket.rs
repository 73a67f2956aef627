//! Source bucket resolution against the configured allow-list

use regex::Regex;

use super::decoder::DecodedRequest;
use super::dialect::RequestDialect;
use crate::config::Config;
use crate::error::ImageRequestError;

/// Resolve the bucket a request reads from
///
/// - Default requests naming a bucket must name an allow-list member, or
///   match the first allow-list entry read as an anchored regex.
/// - Everything else uses the key's first path segment as an alias and
///   picks the first allow-list entry containing it, falling back to the
///   configured fallback bucket.
///
/// `Ok(None)` means no entry matched and no fallback is configured; the
/// pipeline reports that when it gets to the fetch.
pub fn resolve_bucket(
    dialect: Option<RequestDialect>,
    decoded: Option<&DecodedRequest>,
    key: &str,
    config: &Config,
) -> Result<Option<String>, ImageRequestError> {
    let allowed = config.allowed_source_buckets()?;

    match dialect {
        Some(RequestDialect::Default) => match decoded.and_then(|d| d.bucket.as_deref()) {
            Some(bucket) => {
                if is_allowed(bucket, &allowed) {
                    Ok(Some(bucket.to_string()))
                } else {
                    tracing::warn!(bucket = %bucket, "Requested bucket is not in the allow-list");
                    Err(ImageRequestError::cannot_access_bucket())
                }
            }
            None => Ok(bucket_for_alias(key, &allowed, config)),
        },
        Some(RequestDialect::Thumbor) | Some(RequestDialect::Custom) => {
            Ok(bucket_for_alias(key, &allowed, config))
        }
        None => Err(ImageRequestError::cannot_find_bucket()),
    }
}

fn is_allowed(bucket: &str, allowed: &[String]) -> bool {
    if allowed.iter().any(|entry| entry == bucket) {
        return true;
    }

    // The first entry may be a pattern covering several buckets
    allowed
        .first()
        .and_then(|pattern| Regex::new(&format!("^(?:{})$", pattern)).ok())
        .map(|re| re.is_match(bucket))
        .unwrap_or(false)
}

fn bucket_for_alias(key: &str, allowed: &[String], config: &Config) -> Option<String> {
    let alias = key.split('/').next().unwrap_or_default();

    let matched = if alias.is_empty() {
        None
    } else {
        allowed.iter().find(|entry| entry.contains(alias)).cloned()
    };

    matched.or_else(|| config.fallback_bucket.clone())
}

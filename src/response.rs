//! Response headers and error bodies for the invoking runtime

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::ImageRequestError;
use crate::request::format::vary_header;
use crate::request::ImageRequestInfo;

/// Header name → value, sorted for stable output
pub type ResponseHeaders = BTreeMap<String, String>;

const ALLOW_METHODS: &str = "GET";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Response returned when the pipeline fails
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub headers: ResponseHeaders,
    pub body: String,
}

fn cors_headers(config: &Config) -> ResponseHeaders {
    let mut headers = ResponseHeaders::new();
    headers.insert("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string());
    headers.insert("Access-Control-Allow-Headers".to_string(), ALLOW_HEADERS.to_string());
    if config.cors.enabled {
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            config.cors.origin.clone(),
        );
    }
    headers
}

/// Headers for a successfully resolved request
///
/// Headers supplied in a Default request override the computed ones.
pub fn success_headers(info: &ImageRequestInfo, config: &Config) -> ResponseHeaders {
    let mut headers = cors_headers(config);
    headers.insert("Content-Type".to_string(), info.content_type.clone());
    headers.insert("Cache-Control".to_string(), info.cache_control.clone());

    if let Some(expires) = &info.expires {
        headers.insert("Expires".to_string(), expires.clone());
    }
    if let Some(last_modified) = &info.last_modified {
        headers.insert("Last-Modified".to_string(), last_modified.clone());
    }
    if config.auto_webp {
        headers.insert("Vary".to_string(), vary_header().to_string());
    }

    if let Some(custom) = &info.headers {
        for (name, value) in custom {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            headers.insert(name.clone(), value);
        }
    }

    headers
}

/// Error response with a JSON `{status, code, message}` body
pub fn error_response(err: &ImageRequestError, config: &Config) -> ErrorResponse {
    let mut headers = cors_headers(config);
    headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());

    let body = serde_json::to_string(&err.body()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize error body");
        format!(r#"{{"status":{},"code":"{}"}}"#, err.status(), err.code)
    });

    ErrorResponse {
        status_code: err.status(),
        headers,
        body,
    }
}

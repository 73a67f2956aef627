//! Default dialect decoding: `/` + base64(JSON request)

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::edits::Edits;
use crate::error::ImageRequestError;

/// JSON record carried by a Default dialect path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edits: Option<Edits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// Kept loosely typed; callers may send numbers or numeric strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction_effort: Option<Value>,
}

/// Decode a Default dialect path
///
/// Strips a single leading `/`, then base64 → UTF-8 → JSON. A payload that
/// is valid JSON but not shaped like a request is still a decode failure.
pub fn decode_request(path: Option<&str>) -> Result<DecodedRequest, ImageRequestError> {
    let value = decode_json(path)?;
    serde_json::from_value(value).map_err(|_| ImageRequestError::cannot_decode_request())
}

/// Base64 → UTF-8 → untyped JSON, without checking the request shape
pub fn decode_json(path: Option<&str>) -> Result<Value, ImageRequestError> {
    let path = path.ok_or_else(ImageRequestError::cannot_read_path)?;
    let encoded = path.strip_prefix('/').unwrap_or(path);

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| ImageRequestError::cannot_decode_request())?;
    let text = std::str::from_utf8(&bytes).map_err(|_| ImageRequestError::cannot_decode_request())?;

    serde_json::from_str(text).map_err(|_| ImageRequestError::cannot_decode_request())
}

/// Encode a request the way clients build Default dialect paths (without the leading `/`)
pub fn encode_request(request: &DecodedRequest) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(request)?;
    Ok(STANDARD.encode(json))
}

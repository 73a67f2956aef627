//! Content type detection from magic bytes
//!
//! Used when storage reports a generic binary content type.

use crate::error::ImageRequestError;

/// Infer an image content type from the first four bytes of `data`
pub fn sniff_content_type(data: &[u8]) -> Result<&'static str, ImageRequestError> {
    let header = data
        .get(..4)
        .map(hex::encode_upper)
        .ok_or_else(ImageRequestError::request_type_error)?;

    match header.as_str() {
        "89504E47" => Ok("image/png"),
        "FFD8FFDB" | "FFD8FFE0" | "FFD8FFEE" | "FFD8FFE1" => Ok("image/jpeg"),
        "52494646" => Ok("image/webp"),
        "49492A00" | "4D4D002A" => Ok("image/tiff"),
        _ => {
            tracing::debug!(header = %header, "Unrecognized image signature");
            Err(ImageRequestError::request_type_error())
        }
    }
}

// Error types module

use http::StatusCode;
use serde::Serialize;

/// Error categories, each bound to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Malformed path, missing signature parameter, missing bucket configuration
    BadRequest,
    /// Bucket outside the allow-list, signature mismatch
    Forbidden,
    /// Bucket or image absent after fallback
    NotFound,
    /// Unexpected storage errors, sniff failures, signature plumbing failures
    InternalServerError,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured failure for a single image request
///
/// Every failure carries a status, a machine-readable code and a
/// human-readable message. Nothing is retried on these; they propagate to
/// the caller unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ImageRequestError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

/// JSON body returned to clients for a failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: u16,
    pub code: &'a str,
    pub message: &'a str,
}

impl ImageRequestError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.kind.status().as_u16()
    }

    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            status: self.status(),
            code: &self.code,
            message: &self.message,
        }
    }

    // === Classification / decoding ===

    pub fn unrecognized_dialect() -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "UnrecognizedDialect",
            "The type of request you are making could not be processed. Please ensure that \
             your original image is of a supported file type (jpg, png, tiff, webp, svg) and \
             that your image request is provided in the correct syntax.",
        )
    }

    pub fn cannot_read_path() -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "CannotReadPath",
            "The URL path you provided could not be read. Please ensure that it is properly \
             formed according to the solution documentation.",
        )
    }

    pub fn cannot_decode_request() -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "CannotDecodeRequest",
            "The image request you provided could not be decoded. Please check that your \
             request is base64 encoded properly and that the decoded payload is valid JSON.",
        )
    }

    pub fn cannot_find_image() -> Self {
        Self::new(
            ErrorKind::NotFound,
            "CannotFindImage",
            "The image you specified could not be found. Please check your request syntax as \
             well as the bucket you specified to ensure it exists.",
        )
    }

    pub fn invalid_edit(edit: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "InvalidEdit",
            format!("Invalid edit '{}': {}", edit, message.into()),
        )
    }

    pub fn invalid_output_format(format: &str) -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "InvalidOutputFormat",
            format!(
                "Output format '{}' is not supported. Use one of jpeg, png, webp, tiff, heif.",
                format
            ),
        )
    }

    pub fn invalid_rewrite_pattern(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InternalServerError,
            "InvalidRewritePattern",
            message,
        )
    }

    // === Bucket resolution ===

    pub fn no_source_buckets() -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "NoSourceBuckets",
            "The SOURCE_BUCKETS variable could not be read. Please check that it is not empty \
             and contains at least one source bucket, or multiple buckets separated by commas.",
        )
    }

    pub fn cannot_access_bucket() -> Self {
        Self::new(
            ErrorKind::Forbidden,
            "CannotAccessBucket",
            "The bucket you specified could not be accessed. Please check that the bucket is \
             specified in your SOURCE_BUCKETS.",
        )
    }

    pub fn cannot_find_bucket() -> Self {
        Self::new(
            ErrorKind::NotFound,
            "CannotFindBucket",
            "The bucket you specified could not be found. Please check the spelling of the \
             bucket name in your request.",
        )
    }

    pub fn no_such_bucket() -> Self {
        Self::new(
            ErrorKind::NotFound,
            "NoSuchBucket",
            "No allowed bucket matched the request and no fallback bucket is configured.",
        )
    }

    // === Origin ===

    pub fn no_such_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "NoSuchKey", message)
    }

    /// Unexpected storage failure, keeping the backend's code and message
    pub fn storage_failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, code, message)
    }

    pub fn request_type_error() -> Self {
        Self::new(
            ErrorKind::InternalServerError,
            "RequestTypeError",
            "The file does not have an extension and the file type could not be inferred. \
             Please ensure that your original image is of a supported file type (jpg, png, \
             tiff, webp).",
        )
    }

    // === Signature ===

    pub fn missing_signature() -> Self {
        Self::new(
            ErrorKind::BadRequest,
            "AuthorizationQueryParametersError",
            "Query-string requires the signature parameter.",
        )
    }

    pub fn signature_mismatch() -> Self {
        Self::new(
            ErrorKind::Forbidden,
            "SignatureDoesNotMatch",
            "Signature does not match.",
        )
    }

    pub fn signature_validation_failure() -> Self {
        Self::new(
            ErrorKind::InternalServerError,
            "SignatureValidationFailure",
            "Signature validation failed.",
        )
    }

    pub fn is_signature_mismatch(&self) -> bool {
        self.code == "SignatureDoesNotMatch"
    }
}

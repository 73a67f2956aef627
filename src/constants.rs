// Constants module - centralized default values
//
// Environment variable names and defaults used by the configuration layer
// and the request pipeline.

// =============================================================================
// Environment variables
// =============================================================================

pub const ENV_SOURCE_BUCKETS: &str = "SOURCE_BUCKETS";
pub const ENV_AUTO_WEBP: &str = "AUTO_WEBP";
pub const ENV_ENABLE_SIGNATURE: &str = "ENABLE_SIGNATURE";
pub const ENV_SECRETS_MANAGER: &str = "SECRETS_MANAGER";
pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
pub const ENV_REWRITE_MATCH_PATTERN: &str = "REWRITE_MATCH_PATTERN";
pub const ENV_REWRITE_SUBSTITUTION: &str = "REWRITE_SUBSTITUTION";
pub const ENV_DEFAULT_FALLBACK_BUCKET: &str = "DEFAULT_FALLBACK_BUCKET";
pub const ENV_CORS_ENABLED: &str = "CORS_ENABLED";
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";

// =============================================================================
// Response defaults
// =============================================================================

/// Cache-Control used when storage reports none (one year, public)
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=31536000,public";

/// Content type used when storage reports none
pub const FALLBACK_CONTENT_TYPE: &str = "image";

// =============================================================================
// Origin defaults
// =============================================================================

/// File name substituted in the same directory when the requested key is missing
pub const FALLBACK_IMAGE_NAME: &str = "default.jpg";

/// Storage content types that trigger magic-byte sniffing
pub const GENERIC_CONTENT_TYPES: [&str; 2] = ["binary/octet-stream", "application/octet-stream"];

// =============================================================================
// Format defaults
// =============================================================================

/// WebP reduction effort used when the requested one is out of range
pub const DEFAULT_REDUCTION_EFFORT: u8 = 4;

/// Maximum WebP reduction effort
pub const MAX_REDUCTION_EFFORT: i64 = 6;

/// HTTP date layout used for Expires / Last-Modified
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

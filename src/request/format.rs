//! Output format negotiation
//!
//! Decides the encoding handed to the processing engine from, in order:
//! - an explicit `toFormat` edit
//! - the client's Accept header (WebP only, when auto-WebP is enabled)
//! - the decoded request's `outputFormat` (Default dialect only)
//!
//! SVG originals with edits but no explicit format are rasterised to PNG
//! unless one of the signals above picks something else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::decoder::DecodedRequest;
use super::dialect::RequestDialect;
use crate::config::Config;
use crate::constants::{DEFAULT_REDUCTION_EFFORT, MAX_REDUCTION_EFFORT};
use crate::edits::Edits;
use crate::error::ImageRequestError;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Tiff,
    Heif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Webp,
        OutputFormat::Tiff,
        OutputFormat::Heif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Heif => "heif",
        }
    }

    pub fn content_type(&self) -> String {
        format!("image/{}", self.as_str())
    }

    /// Exact match against an edit key (`jpeg`, `png`, ...); aliases are not keys
    pub fn from_edit_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == key)
    }

    /// Format implied by a file extension, if it carries quality settings
    pub fn from_extension(extension: &str) -> Option<Self> {
        extension.parse().ok()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ImageRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            "tiff" => Ok(OutputFormat::Tiff),
            "heif" => Ok(OutputFormat::Heif),
            _ => Err(ImageRequestError::invalid_output_format(s)),
        }
    }
}

/// Result of format negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDecision {
    pub output_format: Option<OutputFormat>,
    pub content_type: String,
    pub reduction_effort: Option<u8>,
}

/// Inputs gathered by the pipeline before negotiation
#[derive(Debug, Clone, Copy)]
pub struct NegotiationContext<'a> {
    pub dialect: RequestDialect,
    pub accept: Option<&'a str>,
    pub decoded: Option<&'a DecodedRequest>,
    /// Content type derived from the origin object
    pub origin_content_type: &'a str,
}

/// Determine the output format, reduction effort and final content type
///
/// For Thumbor and Custom requests the first quality-bearing edit key is
/// renamed to the chosen output format so the engine applies the quality
/// to the encoder actually used.
pub fn negotiate(
    ctx: NegotiationContext<'_>,
    edits: &mut Edits,
    config: &Config,
) -> Result<FormatDecision, ImageRequestError> {
    let mut output_format = None;

    if ctx.origin_content_type == SVG_CONTENT_TYPE && !edits.is_empty() && !edits.contains("toFormat")
    {
        // Rasterise edited SVGs. The format is PNG as observed upstream even
        // though the accompanying note there says WebP.
        output_format = Some(OutputFormat::Png);
    }

    if let Some(candidate) = candidate_format(&ctx, edits, config)? {
        output_format = Some(candidate);
    }

    let reduction_effort = match (output_format, ctx.dialect, ctx.decoded) {
        (Some(OutputFormat::Webp), RequestDialect::Default, Some(decoded)) => decoded
            .reduction_effort
            .as_ref()
            .map(resolve_reduction_effort),
        _ => None,
    };

    let content_type = match output_format {
        Some(format) => {
            if ctx.dialect.is_path_based() && edits.rename_quality_key(format) {
                tracing::debug!(output_format = %format, "Moved quality edit to output format");
            }
            format.content_type()
        }
        None => ctx.origin_content_type.to_string(),
    };

    Ok(FormatDecision {
        output_format,
        content_type,
        reduction_effort,
    })
}

fn candidate_format(
    ctx: &NegotiationContext<'_>,
    edits: &Edits,
    config: &Config,
) -> Result<Option<OutputFormat>, ImageRequestError> {
    if let Some(value) = edits.get("toFormat") {
        let format = value
            .as_str()
            .ok_or_else(|| ImageRequestError::invalid_output_format(&value.to_string()))?;
        return format.parse().map(Some);
    }

    if config.auto_webp && accepts_webp(ctx.accept) {
        return Ok(Some(OutputFormat::Webp));
    }

    if ctx.dialect == RequestDialect::Default {
        if let Some(format) = ctx.decoded.and_then(|d| d.output_format.as_deref()) {
            return format.parse().map(Some);
        }
    }

    Ok(None)
}

/// Truncate the requested effort; anything outside 0..=6 becomes the default
fn resolve_reduction_effort(value: &Value) -> u8 {
    let requested = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match requested.filter(|v| v.is_finite()).map(f64::trunc) {
        Some(effort) if (0.0..=MAX_REDUCTION_EFFORT as f64).contains(&effort) => effort as u8,
        _ => DEFAULT_REDUCTION_EFFORT,
    }
}

/// Whether the Accept header lists `image/webp` with a non-zero quality
pub fn accepts_webp(accept: Option<&str>) -> bool {
    let Some(accept) = accept else {
        return false;
    };

    accept.split(',').any(|part| {
        let (media_type, params) = match part.split_once(';') {
            Some((mt, params)) => (mt.trim(), Some(params)),
            None => (part.trim(), None),
        };
        media_type.eq_ignore_ascii_case("image/webp") && params.map(parse_quality).unwrap_or(1.0) > 0.0
    })
}

/// Parse quality value from parameters (e.g., "q=0.8")
fn parse_quality(params: &str) -> f32 {
    for param in params.split(';') {
        let param = param.trim();
        if let Some(q) = param.strip_prefix("q=") {
            if let Ok(quality) = q.parse::<f32>() {
                return quality.clamp(0.0, 1.0);
            }
        }
    }
    1.0
}

/// Get the Vary header value for auto-WebP responses
pub fn vary_header() -> &'static str {
    "Accept"
}

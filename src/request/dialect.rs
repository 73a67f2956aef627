//! Request dialect classification
//!
//! Decision order is significant, first match wins:
//! 1. Default: strict base64 path that decodes to any JSON value
//! 2. Custom: rewrite pattern and substitution both configured
//! 3. Thumbor: Thumbor-style path ending in a known image extension

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use super::decoder;
use crate::config::Config;
use crate::error::ImageRequestError;

/// URL convention a request was expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestDialect {
    Default,
    Thumbor,
    Custom,
}

impl RequestDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Thumbor => "Thumbor",
            Self::Custom => "Custom",
        }
    }

    /// Thumbor and Custom requests carry their edits in the path itself
    pub fn is_path_based(&self) -> bool {
        matches!(self, Self::Thumbor | Self::Custom)
    }
}

impl fmt::Display for RequestDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(/?)([0-9a-zA-Z+/]{4})*(([0-9a-zA-Z+/]{2}==)|([0-9a-zA-Z+/]{3}=))?$")
            .expect("static base64 pattern is valid")
    })
}

fn thumbor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^(/?)((fit-in)?|(filters:.+\(.?\))?|(unsafe)?).*(\.+jpg|\.+png|\.+webp|\.tiff|\.jpeg|\.svg)$",
        )
        .expect("static thumbor pattern is valid")
    })
}

/// Whether the path is shaped like a padded base64 string
pub fn matches_default_grammar(path: &str) -> bool {
    default_pattern().is_match(path)
}

/// Whether the path is shaped like a Thumbor request
pub fn matches_thumbor_grammar(path: &str) -> bool {
    thumbor_pattern().is_match(path)
}

/// Decide which dialect a request path uses
pub fn classify(path: Option<&str>, config: &Config) -> Result<RequestDialect, ImageRequestError> {
    if let Some(path) = path {
        if matches_default_grammar(path) && decoder::decode_json(Some(path)).is_ok() {
            return Ok(RequestDialect::Default);
        }
    }

    if config.rewrite_rule().is_some() {
        return Ok(RequestDialect::Custom);
    }

    match path {
        Some(path) if matches_thumbor_grammar(path) => Ok(RequestDialect::Thumbor),
        _ => Err(ImageRequestError::unrecognized_dialect()),
    }
}

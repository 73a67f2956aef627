// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    ENV_AUTO_WEBP, ENV_CORS_ENABLED, ENV_CORS_ORIGIN, ENV_DEFAULT_FALLBACK_BUCKET,
    ENV_ENABLE_SIGNATURE, ENV_REWRITE_MATCH_PATTERN, ENV_REWRITE_SUBSTITUTION,
    ENV_SECRETS_MANAGER, ENV_SECRET_KEY, ENV_SOURCE_BUCKETS,
};
use crate::error::ImageRequestError;
use crate::request::rewrite::RewriteRule;

/// Process-wide configuration, loaded once and shared read-only by every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Comma-separated allow-list of source buckets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_buckets: Option<String>,

    /// Serve WebP when the client's Accept header allows it
    #[serde(default)]
    pub auto_webp: bool,

    #[serde(default)]
    pub signature: SignatureConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// Bucket used when no allow-list entry matches the request's alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_bucket: Option<String>,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// Request signing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Identifier of the secret holding the signing key
    #[serde(default)]
    pub secret_source_id: String,
    /// Field of the secret JSON document holding the signing key
    #[serde(default)]
    pub secret_key_field: String,
}

/// Custom dialect rewrite pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub origin: String,
}

/// Only the exact value `Yes` turns a flag on
fn parse_flag(value: Option<String>) -> bool {
    value.as_deref().map(str::trim) == Some("Yes")
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            source_buckets: lookup(ENV_SOURCE_BUCKETS),
            auto_webp: parse_flag(lookup(ENV_AUTO_WEBP)),
            signature: SignatureConfig {
                enabled: parse_flag(lookup(ENV_ENABLE_SIGNATURE)),
                secret_source_id: lookup(ENV_SECRETS_MANAGER).unwrap_or_default(),
                secret_key_field: lookup(ENV_SECRET_KEY).unwrap_or_default(),
            },
            rewrite: RewriteConfig {
                match_pattern: lookup(ENV_REWRITE_MATCH_PATTERN),
                substitution: lookup(ENV_REWRITE_SUBSTITUTION),
            },
            fallback_bucket: lookup(ENV_DEFAULT_FALLBACK_BUCKET).filter(|b| !b.is_empty()),
            cors: CorsConfig {
                enabled: parse_flag(lookup(ENV_CORS_ENABLED)),
                origin: lookup(ENV_CORS_ORIGIN).unwrap_or_default(),
            },
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.signature.enabled {
            if self.signature.secret_source_id.is_empty() {
                return Err(
                    "Signature validation is enabled but no secret identifier is configured"
                        .to_string(),
                );
            }
            if self.signature.secret_key_field.is_empty() {
                return Err(
                    "Signature validation is enabled but no secret key field is configured"
                        .to_string(),
                );
            }
        }

        if let Some(rule) = self.rewrite_rule() {
            rule.compile().map_err(|e| e.message)?;
        }

        if self.cors.enabled && self.cors.origin.is_empty() {
            return Err("CORS is enabled but no origin is configured".to_string());
        }

        Ok(())
    }

    /// Source bucket allow-list, comma-separated and whitespace-trimmed
    pub fn allowed_source_buckets(&self) -> Result<Vec<String>, ImageRequestError> {
        let raw = self
            .source_buckets
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(ImageRequestError::no_source_buckets)?;

        Ok(raw
            .split(',')
            .map(|bucket| bucket.split_whitespace().collect::<String>())
            .filter(|bucket| !bucket.is_empty())
            .collect())
    }

    /// The Custom dialect rule, present only when both values are non-empty
    pub fn rewrite_rule(&self) -> Option<RewriteRule> {
        match (&self.rewrite.match_pattern, &self.rewrite.substitution) {
            (Some(pattern), Some(substitution)) if !pattern.is_empty() && !substitution.is_empty() => {
                Some(RewriteRule::new(pattern.clone(), substitution.clone()))
            }
            _ => None,
        }
    }
}

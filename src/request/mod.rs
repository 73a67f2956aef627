//! Image request pipeline
//!
//! Turns one incoming event into an [`ImageRequestInfo`] descriptor:
//! classify → decode key and edits → resolve bucket → validate signature →
//! fetch origin → negotiate output format.

pub mod bucket;
pub mod content_type;
pub mod decoder;
pub mod dialect;
pub mod format;
pub mod origin;
pub mod rewrite;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

pub use decoder::DecodedRequest;
pub use dialect::RequestDialect;
pub use format::{FormatDecision, OutputFormat};
pub use origin::OriginImage;
pub use rewrite::CompiledRewrite;

use crate::config::Config;
use crate::edits::Edits;
use crate::error::ImageRequestError;
use crate::signature::{self, SecretProvider};
use crate::storage::ObjectStore;
use crate::thumbor;
use format::NegotiationContext;

/// Incoming request as delivered by the invoking runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

impl RequestEvent {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Descriptor handed to the image processing engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequestInfo {
    pub request_type: RequestDialect,
    pub bucket: String,
    pub key: String,
    pub edits: Edits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    pub content_type: String,
    #[serde(skip)]
    pub original_image: Bytes,
    pub cache_control: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_effort: Option<u8>,
}

/// Runs requests against shared, read-only collaborators
pub struct ImageRequestPipeline<'a> {
    config: &'a Config,
    store: &'a dyn ObjectStore,
    secrets: &'a dyn SecretProvider,
    rewrite: OnceLock<Result<CompiledRewrite, ImageRequestError>>,
}

/// Key and edits recovered from the path, before any I/O
struct ParsedRequest {
    dialect: RequestDialect,
    decoded: Option<DecodedRequest>,
    key: String,
    edits: Edits,
}

impl<'a> ImageRequestPipeline<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a dyn ObjectStore,
        secrets: &'a dyn SecretProvider,
    ) -> Self {
        Self {
            config,
            store,
            secrets,
            rewrite: OnceLock::new(),
        }
    }

    /// The Custom dialect rule, compiled on first use
    fn rewrite(&self) -> Result<&CompiledRewrite, ImageRequestError> {
        self.rewrite
            .get_or_init(|| match self.config.rewrite_rule() {
                Some(rule) => rule.compile(),
                None => Err(ImageRequestError::unrecognized_dialect()),
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Build the descriptor for one event
    pub async fn setup(&self, event: &RequestEvent) -> Result<ImageRequestInfo, ImageRequestError> {
        let path = event.path.as_deref();
        let parsed = self.parse(path)?;

        tracing::debug!(
            dialect = %parsed.dialect,
            key = %parsed.key,
            edits = parsed.edits.len(),
            "Parsed image request"
        );

        let bucket = bucket::resolve_bucket(
            Some(parsed.dialect),
            parsed.decoded.as_ref(),
            &parsed.key,
            self.config,
        )?;

        signature::validate_signature(
            path.unwrap_or_default(),
            event.query_string_parameters.as_ref(),
            &self.config.signature,
            self.secrets,
        )
        .await?;

        let bucket = bucket.ok_or_else(|| {
            tracing::warn!(key = %parsed.key, "No bucket matched and no fallback bucket is configured");
            ImageRequestError::no_such_bucket()
        })?;

        let origin = origin::fetch_origin(self.store, &bucket, &parsed.key).await?;

        let ParsedRequest {
            dialect,
            decoded,
            key,
            mut edits,
        } = parsed;

        let decision = format::negotiate(
            NegotiationContext {
                dialect,
                accept: event.header("accept"),
                decoded: decoded.as_ref(),
                origin_content_type: &origin.content_type,
            },
            &mut edits,
            self.config,
        )?;

        tracing::info!(
            dialect = %dialect,
            bucket = %bucket,
            key = %key,
            content_type = %decision.content_type,
            "Image request resolved"
        );

        Ok(ImageRequestInfo {
            request_type: dialect,
            bucket,
            key,
            edits,
            headers: decoded.and_then(|d| d.headers),
            output_format: decision.output_format,
            content_type: decision.content_type,
            original_image: origin.body,
            cache_control: origin.cache_control,
            expires: origin.expires,
            last_modified: origin.last_modified,
            reduction_effort: decision.reduction_effort,
        })
    }

    fn parse(&self, path: Option<&str>) -> Result<ParsedRequest, ImageRequestError> {
        let dialect = dialect::classify(path, self.config)?;

        let (decoded, key, edits) = match dialect {
            RequestDialect::Default => {
                let decoded = decoder::decode_request(path)?;
                let key = decoded.key.clone().unwrap_or_default();
                let edits = decoded.edits.clone().unwrap_or_default();
                (Some(decoded), key, edits)
            }
            RequestDialect::Thumbor => {
                let path = path.ok_or_else(ImageRequestError::cannot_read_path)?;
                (None, thumbor::parse_key(path)?, thumbor::map_path_to_edits(path)?)
            }
            RequestDialect::Custom => {
                let path = path.ok_or_else(ImageRequestError::cannot_read_path)?;
                let rewritten = self.rewrite()?.apply(path);
                (
                    None,
                    thumbor::parse_key(&rewritten)?,
                    thumbor::map_path_to_edits(&rewritten)?,
                )
            }
        };

        if key.is_empty() {
            return Err(ImageRequestError::cannot_find_image());
        }

        Ok(ParsedRequest {
            dialect,
            decoded,
            key,
            edits,
        })
    }
}

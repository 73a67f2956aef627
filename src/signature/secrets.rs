//! Secret providers for signature keys

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use moka::future::Cache;
use std::collections::HashMap;
use std::time::Duration;

/// Failure retrieving a secret
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),
    #[error("secret provider error: {0}")]
    Provider(String),
}

/// Source of secret strings keyed by identifier
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Return the secret string (a JSON document) stored under `id`
    async fn get_secret(&self, id: &str) -> Result<String, SecretError>;
}

/// Cache settings for [`SecretsManagerProvider`]
#[derive(Debug, Clone)]
pub struct SecretCacheConfig {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for SecretCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 16,
            ttl: Duration::from_secs(300),
        }
    }
}

/// AWS Secrets Manager backed provider, memoising secret strings per id
#[derive(Clone)]
pub struct SecretsManagerProvider {
    client: SecretsManagerClient,
    cache: Cache<String, String>,
}

impl SecretsManagerProvider {
    pub fn new(client: SecretsManagerClient, config: SecretCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { client, cache }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(
            SecretsManagerClient::new(config),
            SecretCacheConfig::default(),
        )
    }
}

#[async_trait]
impl SecretProvider for SecretsManagerProvider {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        if let Some(secret) = self.cache.get(id).await {
            return Ok(secret);
        }

        tracing::debug!(secret_id = %id, "Fetching secret from Secrets Manager");
        let output = self
            .client
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .map_err(|e| SecretError::Provider(format!("{}", e.into_service_error())))?;

        let secret = output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::NotFound(id.to_string()))?;

        self.cache.insert(id.to_string(), secret.clone()).await;
        Ok(secret)
    }
}

/// Fixed in-memory secrets, for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(id.into(), secret.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        self.secrets
            .get(id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(id.to_string()))
    }
}

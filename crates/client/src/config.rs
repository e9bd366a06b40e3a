//! Client configuration, read from the environment.

use std::sync::Arc;

use thiserror::Error;

use stockroom_infra::{
    DEFAULT_COLLECTION, DocumentStore, InMemoryDocumentStore, SqliteDocumentStore, StoreError,
};
use stockroom_inventory::DEFAULT_LOW_STOCK_THRESHOLD;
use stockroom_observability::LogFormat;

pub const ENV_COLLECTION: &str = "STOCKROOM_COLLECTION";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOCKROOM_LOW_STOCK_THRESHOLD";
pub const ENV_DATABASE_URL: &str = "STOCKROOM_DATABASE_URL";
pub const ENV_LOG_FORMAT: &str = "STOCKROOM_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("STOCKROOM_DATABASE_URL: unsupported backend '{0}' (expected a sqlite: URL)")]
    UnsupportedBackend(String),
}

/// Which document store the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store; contents are lost on exit.
    InMemory,
    /// SQLite database at `url`.
    Sqlite { url: String },
}

impl StoreBackend {
    fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.is_empty() || url == "memory" {
            return Ok(StoreBackend::InMemory);
        }
        if url.starts_with("sqlite:") {
            return Ok(StoreBackend::Sqlite {
                url: url.to_string(),
            });
        }
        Err(ConfigError::UnsupportedBackend(url.to_string()))
    }

    /// Whether data written through this backend outlives the process.
    pub fn is_persistent(&self) -> bool {
        matches!(self, StoreBackend::Sqlite { .. })
    }

    /// Open the configured store.
    pub async fn open(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match self {
            StoreBackend::InMemory => Ok(Arc::new(InMemoryDocumentStore::new())),
            StoreBackend::Sqlite { url } => {
                let store = SqliteDocumentStore::connect(url).await?;
                tracing::info!(%url, "opened sqlite document store");
                Ok(Arc::new(store))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub collection: String,
    pub low_stock_threshold: u32,
    pub backend: StoreBackend,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            backend: StoreBackend::InMemory,
            log_format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(collection) = lookup(ENV_COLLECTION) {
            let trimmed = collection.trim();
            if trimmed.is_empty() || trimmed.contains('/') {
                return Err(ConfigError::InvalidValue {
                    key: ENV_COLLECTION,
                    value: collection,
                    reason: "expected a non-empty name without '/'".to_string(),
                });
            }
            config.collection = trimmed.to_string();
        }

        if let Some(threshold) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            config.low_stock_threshold =
                threshold
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: ENV_LOW_STOCK_THRESHOLD,
                        value: threshold.clone(),
                        reason: e.to_string(),
                    })?;
        }

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.backend = StoreBackend::parse(&url)?;
        }

        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.log_format = format.parse().map_err(|e: stockroom_observability::UnknownLogFormat| {
                ConfigError::InvalidValue {
                    key: ENV_LOG_FORMAT,
                    value: format.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }
}

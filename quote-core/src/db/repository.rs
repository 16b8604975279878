use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::QuoteRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Text blobs stored on this device under fixed keys.
///
/// This is the durable store: every save lands here before anything is
/// sent to a remote mirror.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError>;

    async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError>;
}

/// Shared store mirrored across devices.
///
/// Two collections: a single settings row holding the full rate config,
/// and one row per quote upserted by id (last write wins).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_settings(&self) -> Result<Option<Value>, RepositoryError>;

    async fn upsert_settings(
        &self,
        config: &Value,
    ) -> Result<(), RepositoryError>;

    async fn upsert_quote(
        &self,
        quote: &QuoteRecord,
    ) -> Result<(), RepositoryError>;

    /// Most recently created first, at most `limit` rows.
    async fn list_quotes(
        &self,
        limit: usize,
    ) -> Result<Vec<QuoteRecord>, RepositoryError>;

    async fn get_quote(
        &self,
        id: &str,
    ) -> Result<QuoteRecord, RepositoryError>;
}

/// What happened to the remote copy of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    /// Written locally and to the remote store.
    Synced,
    /// Written locally only; the remote write failed.
    LocalOnly(String),
    /// No remote store is configured.
    Disabled,
}

impl RemoteSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

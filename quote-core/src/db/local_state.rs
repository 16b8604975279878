use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::repository::{LocalStore, RepositoryError};
use crate::models::{FormSnapshot, QuoteRecord, RatesConfig};

pub const CONFIG_KEY: &str = "config";
pub const LIBRARY_KEY: &str = "quote_library";
pub const AUTOSAVE_KEY: &str = "autosave";

/// Typed view over the three blobs kept in a [`LocalStore`].
///
/// Reads never fail on bad content: an unparseable blob is logged and
/// treated as absent. Store errors are still returned.
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn LocalStore>,
}

impl LocalState {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Raw config blob, before any legacy migration.
    pub async fn config_blob(&self) -> Result<Option<Value>, RepositoryError> {
        let Some(text) = self.store.get(CONFIG_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, "discarding unparseable local config");
                Ok(None)
            }
        }
    }

    pub async fn save_config(
        &self,
        config: &RatesConfig,
    ) -> Result<(), RepositoryError> {
        let text = serde_json::to_string(config)?;
        self.store.put(CONFIG_KEY, &text).await
    }

    /// Library entries as stored, without interpreting them as quotes.
    ///
    /// Unlike the other reads, a blob that is not a JSON list is an error:
    /// callers that write the library back must not overwrite entries they
    /// could not read.
    async fn library_entries(&self) -> Result<Vec<Value>, RepositoryError> {
        let Some(text) = self.store.get(LIBRARY_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&text).map_err(|e| {
            RepositoryError::Serialization(format!("local quote library is unreadable: {e}"))
        })
    }

    /// Every quote saved on this device, newest first.
    ///
    /// Entries that no longer parse are skipped rather than failing the
    /// whole library.
    pub async fn library(&self) -> Result<Vec<QuoteRecord>, RepositoryError> {
        let entries = match self.library_entries().await {
            Ok(entries) => entries,
            Err(RepositoryError::Serialization(e)) => {
                warn!(error = %e, "treating local quote library as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<QuoteRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unreadable quote in local library"),
            }
        }
        Ok(records)
    }

    /// Stores `record` in the library and returns it as written.
    ///
    /// An entry with the same id is replaced in place and keeps its
    /// `created_at`; otherwise the record goes to the front. Every other
    /// entry is written back untouched, including ones that do not parse
    /// as quotes.
    pub async fn upsert_library(
        &self,
        mut record: QuoteRecord,
    ) -> Result<QuoteRecord, RepositoryError> {
        let mut entries = self.library_entries().await?;
        let existing = entries
            .iter()
            .position(|entry| entry.get("id").and_then(Value::as_str) == Some(record.id.as_str()));

        match existing {
            Some(index) => {
                if let Ok(previous) = serde_json::from_value::<QuoteRecord>(entries[index].clone()) {
                    record.created_at = previous.created_at;
                }
                entries[index] = serde_json::to_value(&record)?;
            }
            None => entries.insert(0, serde_json::to_value(&record)?),
        }

        let text = serde_json::to_string(&entries)?;
        self.store.put(LIBRARY_KEY, &text).await?;
        Ok(record)
    }

    pub async fn autosave(&self) -> Result<Option<FormSnapshot>, RepositoryError> {
        let Some(text) = self.store.get(AUTOSAVE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(error = %e, "discarding unparseable autosave");
                Ok(None)
            }
        }
    }

    pub async fn save_autosave(
        &self,
        snapshot: &FormSnapshot,
    ) -> Result<(), RepositoryError> {
        let text = serde_json::to_string(snapshot)?;
        self.store.put(AUTOSAVE_KEY, &text).await
    }
}

//! In-process stores for unit tests, with switches to inject failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::repository::{LocalStore, RemoteStore, RepositoryError};
use crate::models::QuoteRecord;

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Database("store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every later `put` fail with a database error.
    pub fn set_fail_writes(
        &self,
        fail: bool,
    ) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("storage quota exceeded".to_string()));
        }
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Remote mirror kept in memory, with a switch to simulate an outage.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    settings: Mutex<Option<Value>>,
    quotes: Mutex<HashMap<String, QuoteRecord>>,
    offline: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(
        &self,
        offline: bool,
    ) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.lock().map(|q| q.len()).unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Connection("remote store unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_settings(&self) -> Result<Option<Value>, RepositoryError> {
        self.check_online()?;
        Ok(self.settings.lock().map_err(poisoned)?.clone())
    }

    async fn upsert_settings(
        &self,
        config: &Value,
    ) -> Result<(), RepositoryError> {
        self.check_online()?;
        *self.settings.lock().map_err(poisoned)? = Some(config.clone());
        Ok(())
    }

    async fn upsert_quote(
        &self,
        quote: &QuoteRecord,
    ) -> Result<(), RepositoryError> {
        self.check_online()?;
        self.quotes
            .lock()
            .map_err(poisoned)?
            .insert(quote.id.clone(), quote.clone());
        Ok(())
    }

    async fn list_quotes(
        &self,
        limit: usize,
    ) -> Result<Vec<QuoteRecord>, RepositoryError> {
        self.check_online()?;
        let mut quotes: Vec<_> = self
            .quotes
            .lock()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        quotes.truncate(limit);
        Ok(quotes)
    }

    async fn get_quote(
        &self,
        id: &str,
    ) -> Result<QuoteRecord, RepositoryError> {
        self.check_online()?;
        self.quotes
            .lock()
            .map_err(poisoned)?
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::FormSnapshot;

    #[tokio::test]
    async fn list_is_newest_first_and_capped() {
        let remote = MemoryRemoteStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let record = QuoteRecord::from_snapshot(
                format!("q{i}"),
                0,
                FormSnapshot::default(),
                base + Duration::seconds(i),
            );
            remote.upsert_quote(&record).await.unwrap();
        }

        let ids: Vec<_> = remote
            .list_quotes(3)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["q4", "q3", "q2"]);
    }

    #[tokio::test]
    async fn offline_remote_rejects_every_call() {
        let remote = MemoryRemoteStore::new();
        remote.set_offline(true);
        assert!(matches!(
            remote.fetch_settings().await,
            Err(RepositoryError::Connection(_))
        ));
        assert!(matches!(
            remote.get_quote("q1").await,
            Err(RepositoryError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn failing_local_writes_leave_entries_untouched() {
        let local = MemoryLocalStore::new();
        local.put("k", "v1").await.unwrap();
        local.set_fail_writes(true);
        assert!(local.put("k", "v2").await.is_err());
        assert_eq!(local.get("k").await.unwrap().as_deref(), Some("v1"));
        assert_eq!(local.write_count(), 1);
    }
}

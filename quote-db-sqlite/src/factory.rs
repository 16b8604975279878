use async_trait::async_trait;

use quote_core::db::{RemoteConfig, RemoteStoreFactory};
use quote_core::{RemoteStore, RepositoryError};

use crate::repository::SqliteRepository;

/// [`RemoteStoreFactory`] for a shared SQLite file.
///
/// Register this with a [`quote_core::db::RemoteRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use quote_core::db::RemoteRegistry;
/// use quote_db_sqlite::SqliteRemoteFactory;
///
/// let mut registry = RemoteRegistry::new();
/// registry.register(Box::new(SqliteRemoteFactory));
/// ```
pub struct SqliteRemoteFactory;

#[async_trait]
impl RemoteStoreFactory for SqliteRemoteFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a path, `sqlite:` URL or
    /// `:memory:`) and applies migrations. `api_key` is ignored.
    async fn create(
        &self,
        config: &RemoteConfig,
    ) -> Result<Box<dyn RemoteStore>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use quote_core::RemoteStore;
    use quote_core::db::{RemoteConfig, RemoteRegistry, RemoteStoreFactory};

    use super::SqliteRemoteFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRemoteFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_in_memory_store_through_registry() {
        let mut registry = RemoteRegistry::new();
        registry.register(Box::new(SqliteRemoteFactory));

        let config = RemoteConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
            api_key: None,
        };

        let store = registry
            .create(&config)
            .await
            .expect("in-memory store");
        assert!(store.list_quotes(10).await.unwrap().is_empty());
        assert_eq!(store.fetch_settings().await.unwrap(), None);
    }
}

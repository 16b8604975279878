use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{RemoteStore, RepositoryError};

/// Backend-agnostic settings for the shared quote mirror.
///
/// `backend` must match the [`RemoteStoreFactory::backend_name`] of a
/// registered factory. `connection_string` and `api_key` are passed through
/// unchanged and mean whatever that backend needs.
///
/// | backend     | connection_string examples                 |
/// |-------------|--------------------------------------------|
/// | `sqlite`    | `shared.db`, `:memory:`                    |
/// | `postgrest` | `https://project.example.co/rest/v1`       |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub backend: String,
    pub connection_string: String,
    /// Sent as the service key by HTTP backends; ignored by `sqlite`.
    pub api_key: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
            api_key: None,
        }
    }
}

/// One implementation per remote backend, registered with a
/// [`RemoteRegistry`] at startup.
#[async_trait]
pub trait RemoteStoreFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open a connection and return a ready-to-use store.
    async fn create(
        &self,
        config: &RemoteConfig,
    ) -> Result<Box<dyn RemoteStore>, RepositoryError>;
}

/// Registry of [`RemoteStoreFactory`] instances, keyed by backend name.
pub struct RemoteRegistry {
    factories: HashMap<&'static str, Box<dyn RemoteStoreFactory>>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any with the same name.
    pub fn register(&mut self, factory: Box<dyn RemoteStoreFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] if no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &RemoteConfig,
    ) -> Result<Box<dyn RemoteStore>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RemoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

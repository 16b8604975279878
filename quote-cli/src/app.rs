use std::sync::Arc;

use anyhow::{Context, Result};
use quote_core::db::{LocalState, RemoteRegistry};
use quote_core::{ConfigStore, QuoteWorkflow, RemoteStore};
use quote_db_postgrest::PostgrestRemoteFactory;
use quote_db_sqlite::{SqliteRemoteFactory, SqliteRepository};
use tracing::{debug, info, warn};

use crate::settings::Settings;

/// Builds a [`RemoteRegistry`] with every backend compiled into this binary.
///
/// To add a new backend:
/// 1. Implement `RemoteStoreFactory` in its own crate.
/// 2. Add that crate as a dependency here.
/// 3. Add one `registry.register(...)` line below.
pub fn build_registry() -> RemoteRegistry {
    let mut registry = RemoteRegistry::new();
    registry.register(Box::new(SqliteRemoteFactory));
    registry.register(Box::new(PostgrestRemoteFactory));
    registry
}

/// Open stores plus the settings they were opened with.
pub struct App {
    pub settings: Settings,
    pub local: LocalState,
    pub remote: Option<Arc<dyn RemoteStore>>,
}

impl App {
    /// Opens the local database and, when configured, the shared store.
    ///
    /// The local database is required. An unreachable shared store is
    /// logged and the app continues local-only.
    pub async fn open(settings: Settings) -> Result<Self> {
        let path = &settings.database.path;
        debug!(path = %path, "opening local database");
        let repo = SqliteRepository::new(path)
            .await
            .with_context(|| format!("Failed to open local database: {path}"))?;
        repo.run_migrations().await?;

        let remote = match settings.remote_config() {
            Some(config) => match build_registry().create(&config).await {
                Ok(store) => {
                    info!(backend = %config.backend, "shared store connected");
                    Some(Arc::from(store))
                }
                Err(e) => {
                    warn!(backend = %config.backend, error = %e, "shared store unavailable; working locally");
                    None
                }
            },
            None => {
                debug!("no shared store configured");
                None
            }
        };

        Ok(Self::from_parts(settings, LocalState::new(Arc::new(repo)), remote))
    }

    pub fn from_parts(
        settings: Settings,
        local: LocalState,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        Self {
            settings,
            local,
            remote,
        }
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.local.clone(), self.remote.clone())
    }

    /// Resolves the active config and starts an editing workflow on it.
    pub async fn workflow(&self) -> QuoteWorkflow {
        let config = self.config_store().load().await;
        let workflow = QuoteWorkflow::new(config, self.local.clone(), self.remote.clone());
        if self.settings.autosave.enabled {
            workflow.with_autosave(self.settings.autosave.delay())
        } else {
            workflow
        }
    }
}

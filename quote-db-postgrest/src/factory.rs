use async_trait::async_trait;

use quote_core::db::{RemoteConfig, RemoteStoreFactory};
use quote_core::{RemoteStore, RepositoryError};

use crate::repository::PostgrestRepository;

/// [`RemoteStoreFactory`] for a PostgREST endpoint (`"postgrest"`).
///
/// `connection_string` is the REST root URL and `api_key` the service key.
pub struct PostgrestRemoteFactory;

#[async_trait]
impl RemoteStoreFactory for PostgrestRemoteFactory {
    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    async fn create(
        &self,
        config: &RemoteConfig,
    ) -> Result<Box<dyn RemoteStore>, RepositoryError> {
        let url = config.connection_string.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(RepositoryError::Configuration(format!(
                "postgrest backend needs an http(s) URL, got '{url}'"
            )));
        }
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                RepositoryError::Configuration("postgrest backend needs an API key".to_string())
            })?;
        Ok(Box::new(PostgrestRepository::new(url, api_key)?))
    }
}

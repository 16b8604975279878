pub mod calculations;
pub mod config;
pub mod db;
pub mod export;
pub mod form;
pub mod keymap;
pub mod models;
pub mod session;

pub use config::{ConfigError, ConfigStore};
pub use db::repository::{LocalStore, RemoteStore, RemoteSync, RepositoryError};
pub use form::FormState;
pub use models::*;
pub use session::{QuoteError, QuoteWorkflow};

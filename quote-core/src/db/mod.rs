pub mod factory;
pub mod local_state;
#[cfg(test)]
pub mod memory;
pub mod repository;

pub use factory::{RemoteConfig, RemoteRegistry, RemoteStoreFactory};
pub use local_state::{AUTOSAVE_KEY, CONFIG_KEY, LIBRARY_KEY, LocalState};
pub use repository::{LocalStore, RemoteStore, RemoteSync, RepositoryError};

mod factory;
mod repository;
mod row;

pub use factory::SqliteRemoteFactory;
pub use repository::SqliteRepository;

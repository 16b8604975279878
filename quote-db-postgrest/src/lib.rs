mod factory;
mod repository;

pub use factory::PostgrestRemoteFactory;
pub use repository::PostgrestRepository;

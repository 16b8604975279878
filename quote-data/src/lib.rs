mod loader;

pub use loader::{LoadSummary, RateRecord, RateTableLoader, RateTableLoaderError};

mod form_snapshot;
mod global_config;
mod quote_record;
mod rate_item;
mod rates_config;

pub use form_snapshot::{FormSnapshot, LabourEntry, LineItem, VehicleEntry, DEFAULT_AREA};
pub use global_config::GlobalConfig;
pub use quote_record::{QuoteRecord, QuoteStatus, QuoteSummary};
pub use rate_item::{RateCategory, RateItem};
pub use rates_config::{DEFAULT_SCOPE, DEFAULT_TERMS, RatesConfig};

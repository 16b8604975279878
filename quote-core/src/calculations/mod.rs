//! Pricing calculations for the quote form.
//!
//! Everything here is pure: the same snapshot and rate tables always
//! produce the same totals.

pub mod common;
pub mod pricing;

pub use pricing::{LABOUR_COST_PER_HOUR, PricingEngine, PricingResult, RowTotal};

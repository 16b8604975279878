//! Upgrade of the first-generation settings layout.
//!
//! The old layout stored every rate under `val`, kept globals as a list of
//! `{id, val}` pairs (`g1`..`g4`) and had no per-day flag on expenses.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::ConfigError;
use crate::models::{DEFAULT_SCOPE, DEFAULT_TERMS, GlobalConfig, RateItem, RatesConfig};

#[derive(Debug, Deserialize)]
struct LegacyItem {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    val: Decimal,
}

#[derive(Debug, Deserialize)]
struct LegacyGlobal {
    id: String,
    #[serde(default)]
    val: Decimal,
}

#[derive(Debug, Deserialize)]
struct LegacyConfig {
    labour: Vec<LegacyItem>,
    #[serde(default)]
    vehicles: Vec<LegacyItem>,
    #[serde(default)]
    expenses: Vec<LegacyItem>,
    #[serde(default)]
    globals: Vec<LegacyGlobal>,
    #[serde(default)]
    terms: Option<String>,
}

/// True when the first labour entry still carries a `val` field.
pub fn is_legacy(value: &Value) -> bool {
    value
        .get("labour")
        .and_then(|labour| labour.get(0))
        .is_some_and(|first| first.get("val").is_some())
}

/// Converts a legacy blob into the current layout.
///
/// A global that is missing or zero takes its built-in default. VAT is
/// always reset to 20% and the default scope to the built-in text.
pub fn migrate_legacy(value: Value) -> Result<RatesConfig, ConfigError> {
    let legacy: LegacyConfig =
        serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let defaults = GlobalConfig::default();
    let global = |id: &str, fallback: Decimal| {
        legacy
            .globals
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.val)
            .filter(|val| !val.is_zero())
            .unwrap_or(fallback)
    };

    let globals = GlobalConfig {
        day_hours: global("g1", defaults.day_hours),
        ooh_multiplier: global("g2", defaults.ooh_multiplier),
        sat_multiplier: global("g3", defaults.sat_multiplier),
        sun_multiplier: global("g4", defaults.sun_multiplier),
        vat_rate: Decimal::new(20, 2),
        margin_target: defaults.margin_target,
    };

    let convert = |items: Vec<LegacyItem>| -> Vec<RateItem> {
        items
            .into_iter()
            .map(|item| RateItem::new(item.id, item.label, item.val))
            .collect()
    };

    let expenses = legacy
        .expenses
        .into_iter()
        .map(|item| {
            let per_day = item.label.contains("Parking") || item.label.contains("ULEZ");
            let mut rate = RateItem::new(item.id, item.label, item.val);
            rate.per_day = per_day;
            rate
        })
        .collect();

    Ok(RatesConfig {
        labour: convert(legacy.labour),
        vehicles: convert(legacy.vehicles),
        expenses,
        globals,
        terms: legacy
            .terms
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TERMS.to_string()),
        default_scope: DEFAULT_SCOPE.to_string(),
        default_issuer: String::new(),
    })
}

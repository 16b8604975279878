use std::io::Read;

use quote_core::{ConfigError, ConfigStore, RateCategory, RateItem, RatesConfig, RemoteSync};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading a rate table.
#[derive(Debug, Error)]
pub enum RateTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown category '{category}' for rate '{id}'")]
    InvalidCategory { id: String, category: String },

    #[error("Rate '{0}' has a negative value")]
    NegativeRate(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<csv::Error> for RateTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RateTableLoaderError::CsvParse(err.to_string())
    }
}

/// One row of a rate table CSV.
///
/// - `category`: `labour`, `vehicle` or `expense` (plurals accepted)
/// - `id`: rate id, matched against the existing config
/// - `label`: display label; empty keeps the current one
/// - `rate`: day rate, hire rate or unit cost
/// - `per_day`: `true`/`yes`/`1` to charge an expense per day on site
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateRecord {
    pub category: String,
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub rate: Decimal,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub per_day: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        s.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "yes" | "y" | "1")
    ))
}

/// What a load changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub updated: usize,
    pub added: usize,
}

/// Bulk update of the rate tables from CSV.
///
/// Rows whose id already exists in the category overwrite it in place;
/// new ids are appended. Applying the same table twice leaves the config
/// unchanged the second time.
pub struct RateTableLoader;

impl RateTableLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateRecord>, RateTableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RateRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn apply(
        config: &mut RatesConfig,
        records: &[RateRecord],
    ) -> Result<LoadSummary, RateTableLoaderError> {
        let mut summary = LoadSummary::default();

        for record in records {
            let category = RateCategory::parse(&record.category).ok_or_else(|| {
                RateTableLoaderError::InvalidCategory {
                    id: record.id.clone(),
                    category: record.category.clone(),
                }
            })?;
            if record.rate.is_sign_negative() && !record.rate.is_zero() {
                return Err(RateTableLoaderError::NegativeRate(record.id.clone()));
            }
            let per_day = category == RateCategory::Expense && record.per_day;

            let items = config.items_mut(category);
            match items.iter_mut().find(|item| item.id == record.id) {
                Some(item) => {
                    if !record.label.is_empty() {
                        item.label = record.label.clone();
                    }
                    item.rate = record.rate;
                    item.per_day = per_day;
                    summary.updated += 1;
                }
                None => {
                    let mut item = RateItem::new(record.id.clone(), record.label.clone(), record.rate);
                    item.per_day = per_day;
                    items.push(item);
                    summary.added += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Loads the active config, applies `records` and saves it back through
    /// the admin path.
    pub async fn load(
        store: &ConfigStore,
        records: &[RateRecord],
    ) -> Result<(LoadSummary, RemoteSync), RateTableLoaderError> {
        let mut config = store.load().await;
        let summary = Self::apply(&mut config, records)?;
        let sync = store.save_admin(&config).await?;
        info!(updated = summary.updated, added = summary.added, "rate table applied");
        Ok((summary, sync))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "category,id,label,rate,per_day\n";

    fn parse(rows: &str) -> Vec<RateRecord> {
        RateTableLoader::parse(format!("{HEADER}{rows}").as_bytes()).expect("Failed to parse CSV")
    }

    #[test]
    fn parses_a_row() {
        let records = parse("labour,l1,Installer,340,\n");
        assert_eq!(
            records,
            vec![RateRecord {
                category: "labour".to_string(),
                id: "l1".to_string(),
                label: "Installer".to_string(),
                rate: dec!(340),
                per_day: false,
            }]
        );
    }

    #[test]
    fn per_day_flag_spellings() {
        let records = parse("expense,a,A,1,true\nexpense,b,B,1,Yes\nexpense,c,C,1,0\nexpense,d,D,1,\n");
        let flags: Vec<_> = records.iter().map(|r| r.per_day).collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn bad_rate_is_a_parse_error() {
        let err = RateTableLoader::parse(format!("{HEADER}labour,l1,X,lots,\n").as_bytes())
            .unwrap_err();
        assert!(matches!(err, RateTableLoaderError::CsvParse(_)));
    }

    #[test]
    fn apply_updates_existing_and_appends_new() {
        let mut config = RatesConfig::default();
        let records = parse("labour,l1,,340,\nvehicles,v9,Crane,900,\n");

        let summary = RateTableLoader::apply(&mut config, &records).unwrap();

        assert_eq!(summary, LoadSummary { updated: 1, added: 1 });
        assert_eq!(config.labour[0].rate, dec!(340));
        assert_eq!(config.labour[0].label, "Installer + Vehicle");
        let crane = config.vehicles.last().unwrap();
        assert_eq!((crane.id.as_str(), crane.rate), ("v9", dec!(900)));
    }

    #[test]
    fn apply_is_idempotent() {
        let records = parse("labour,l6,Night Supervisor,260,\nexpense,e5,Congestion,18,yes\n");
        let mut once = RatesConfig::default();
        RateTableLoader::apply(&mut once, &records).unwrap();
        let mut twice = once.clone();
        let summary = RateTableLoader::apply(&mut twice, &records).unwrap();

        assert_eq!(twice, once);
        assert_eq!(summary, LoadSummary { updated: 2, added: 0 });
    }

    #[test]
    fn per_day_only_applies_to_expenses() {
        let mut config = RatesConfig::default();
        let records = parse("labour,l1,Installer,300,yes\n");
        RateTableLoader::apply(&mut config, &records).unwrap();
        assert!(!config.labour[0].per_day);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut config = RatesConfig::default();
        let records = parse("plant,p1,Forklift,100,\n");
        let err = RateTableLoader::apply(&mut config, &records).unwrap_err();
        assert!(matches!(err, RateTableLoaderError::InvalidCategory { .. }));
        assert_eq!(config, RatesConfig::default());
    }

    #[test]
    fn negative_rate_is_rejected() {
        let mut config = RatesConfig::default();
        let records = parse("labour,l1,Installer,-1,\n");
        assert!(matches!(
            RateTableLoader::apply(&mut config, &records),
            Err(RateTableLoaderError::NegativeRate(_))
        ));
    }
}

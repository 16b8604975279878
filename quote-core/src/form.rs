//! Editable form state and its conversion to and from [`FormSnapshot`].

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::calculations::common::format_money;
use crate::calculations::{PricingEngine, PricingResult};
use crate::models::{
    DEFAULT_AREA, FormSnapshot, LabourEntry, LineItem, QuoteStatus, RateCategory, RatesConfig,
    VehicleEntry,
};

static PASTE_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|,\t]").expect("paste delimiter regex is valid"));

/// Date format of the `quoteDate` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("no {category} rate with id '{id}'")]
    UnknownRate { category: &'static str, id: String },

    #[error("no item at position {0}")]
    NoSuchItem(usize),
}

/// Header fields that take a single text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Ref,
    Date,
    Client,
    Project,
    Site,
    Scope,
    DaysOnSite,
    IssuedBy,
}

impl FromStr for HeaderField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ref" | "quoteref" => Ok(Self::Ref),
            "date" | "quotedate" => Ok(Self::Date),
            "client" | "clientname" => Ok(Self::Client),
            "project" | "projname" => Ok(Self::Project),
            "site" | "siteaddr" => Ok(Self::Site),
            "scope" | "scopenotes" => Ok(Self::Scope),
            "days" | "daysonsite" => Ok(Self::DaysOnSite),
            "issuer" | "issuedby" => Ok(Self::IssuedBy),
            _ => Err(FormError::UnknownField(s.to_string())),
        }
    }
}

/// The values currently entered in the quote form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    pub quote_ref: String,
    pub quote_date: String,
    pub client_name: String,
    pub proj_name: String,
    pub site_addr: String,
    pub scope_notes: String,
    pub days_on_site: String,
    pub issued_by: String,
    pub items: Vec<LineItem>,
    pub labour: BTreeMap<String, LabourEntry>,
    pub vehicles: BTreeMap<String, VehicleEntry>,
    pub expenses: BTreeMap<String, String>,
    pub status: QuoteStatus,
}

impl FormState {
    /// A fresh quote dated `today` with the default scope and one blank item.
    pub fn blank(
        config: &RatesConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            quote_date: today.format(DATE_FORMAT).to_string(),
            scope_notes: config.default_scope.clone(),
            issued_by: config.default_issuer.clone(),
            items: vec![LineItem::blank()],
            ..Self::default()
        }
    }

    /// Repopulates the form from a stored snapshot.
    ///
    /// Entries are read only for the ids in `config`; anything keyed by an id
    /// the config no longer has is dropped.
    pub fn restore(
        snapshot: &FormSnapshot,
        config: &RatesConfig,
    ) -> Self {
        let or_default = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        let mut items: Vec<LineItem> = snapshot
            .items
            .iter()
            .map(|item| LineItem {
                desc: item.desc.clone(),
                qty: or_default(&item.qty, "1"),
                rate: item.rate.clone(),
            })
            .collect();
        if items.is_empty() {
            items.push(LineItem::blank());
        }

        let labour = config
            .labour
            .iter()
            .filter_map(|rate| {
                snapshot
                    .labour_data
                    .get(&rate.id)
                    .map(|entry| (rate.id.clone(), entry.clone()))
            })
            .collect();

        let vehicles = config
            .vehicles
            .iter()
            .filter_map(|rate| {
                snapshot.vehicle_data.get(&rate.id).map(|entry| {
                    let entry = VehicleEntry {
                        qty: entry.qty.clone(),
                        area: or_default(&entry.area, DEFAULT_AREA),
                    };
                    (rate.id.clone(), entry)
                })
            })
            .collect();

        let expenses = config
            .expenses
            .iter()
            .filter_map(|rate| {
                snapshot
                    .expense_data
                    .get(&rate.id)
                    .filter(|qty| !qty.is_empty())
                    .map(|qty| (rate.id.clone(), qty.clone()))
            })
            .collect();

        Self {
            quote_ref: snapshot.quote_ref.clone(),
            quote_date: snapshot.quote_date.clone(),
            client_name: snapshot.client_name.clone(),
            proj_name: snapshot.proj_name.clone(),
            site_addr: snapshot.site_addr.clone(),
            scope_notes: or_default(&snapshot.scope_notes, &config.default_scope),
            days_on_site: snapshot.days_on_site.clone(),
            issued_by: or_default(&snapshot.issued_by, &config.default_issuer),
            items,
            labour,
            vehicles,
            expenses,
            status: snapshot.status,
        }
    }

    /// Reads the form into a snapshot, with `finalTotal` priced against
    /// `config`.
    pub fn capture(
        &self,
        config: &RatesConfig,
    ) -> FormSnapshot {
        let mut snapshot = self.snapshot_inputs(config);
        let totals = PricingEngine::new(config).calculate(&snapshot);
        snapshot.final_total = format_money(totals.total_money);
        snapshot
    }

    pub fn totals(
        &self,
        config: &RatesConfig,
    ) -> PricingResult {
        PricingEngine::new(config).calculate(&self.snapshot_inputs(config))
    }

    fn snapshot_inputs(
        &self,
        config: &RatesConfig,
    ) -> FormSnapshot {
        let labour_data = config
            .labour
            .iter()
            .map(|rate| {
                let entry = self.labour.get(&rate.id).cloned().unwrap_or_default();
                (rate.id.clone(), entry)
            })
            .collect();
        let vehicle_data = config
            .vehicles
            .iter()
            .map(|rate| {
                let entry = self.vehicles.get(&rate.id).cloned().unwrap_or_default();
                (rate.id.clone(), entry)
            })
            .collect();
        let expense_data = config
            .expenses
            .iter()
            .map(|rate| {
                let qty = self.expenses.get(&rate.id).cloned().unwrap_or_default();
                (rate.id.clone(), qty)
            })
            .collect();

        FormSnapshot {
            quote_ref: self.quote_ref.clone(),
            quote_date: self.quote_date.clone(),
            client_name: self.client_name.clone(),
            proj_name: self.proj_name.clone(),
            site_addr: self.site_addr.clone(),
            scope_notes: self.scope_notes.clone(),
            days_on_site: self.days_on_site.clone(),
            issued_by: self.issued_by.clone(),
            final_total: String::new(),
            items: self.items.clone(),
            labour_data,
            vehicle_data,
            expense_data,
            status: self.status,
        }
    }

    pub fn set_field(
        &mut self,
        field: HeaderField,
        value: impl Into<String>,
    ) {
        let value = value.into();
        match field {
            HeaderField::Ref => self.quote_ref = value,
            HeaderField::Date => self.quote_date = value,
            HeaderField::Client => self.client_name = value,
            HeaderField::Project => self.proj_name = value,
            HeaderField::Site => self.site_addr = value,
            HeaderField::Scope => self.scope_notes = value,
            HeaderField::DaysOnSite => self.days_on_site = value,
            HeaderField::IssuedBy => self.issued_by = value,
        }
    }

    pub fn add_item(
        &mut self,
        item: LineItem,
    ) {
        self.items.push(item);
    }

    pub fn remove_item(
        &mut self,
        index: usize,
    ) -> Result<LineItem, FormError> {
        if index >= self.items.len() {
            return Err(FormError::NoSuchItem(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn update_item(
        &mut self,
        index: usize,
        item: LineItem,
    ) -> Result<(), FormError> {
        let slot = self
            .items
            .get_mut(index)
            .ok_or(FormError::NoSuchItem(index))?;
        *slot = item;
        Ok(())
    }

    /// Moves the item at `from` so that it ends up at position `to`.
    pub fn move_item(
        &mut self,
        from: usize,
        to: usize,
    ) -> Result<(), FormError> {
        if from >= self.items.len() {
            return Err(FormError::NoSuchItem(from));
        }
        if to >= self.items.len() {
            return Err(FormError::NoSuchItem(to));
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    pub fn set_labour(
        &mut self,
        config: &RatesConfig,
        id: &str,
        qty: impl Into<String>,
        days: impl Into<String>,
    ) -> Result<(), FormError> {
        check_rate(config, RateCategory::Labour, id)?;
        self.labour.insert(
            id.to_string(),
            LabourEntry {
                qty: qty.into(),
                days: days.into(),
            },
        );
        Ok(())
    }

    pub fn set_vehicle(
        &mut self,
        config: &RatesConfig,
        id: &str,
        qty: impl Into<String>,
        area: Option<String>,
    ) -> Result<(), FormError> {
        check_rate(config, RateCategory::Vehicle, id)?;
        let entry = self.vehicles.entry(id.to_string()).or_default();
        entry.qty = qty.into();
        if let Some(area) = area {
            entry.area = area;
        }
        Ok(())
    }

    pub fn set_expense(
        &mut self,
        config: &RatesConfig,
        id: &str,
        qty: impl Into<String>,
    ) -> Result<(), FormError> {
        check_rate(config, RateCategory::Expense, id)?;
        self.expenses.insert(id.to_string(), qty.into());
        Ok(())
    }

    /// Appends one item per usable pasted line and returns how many were
    /// added.
    pub fn paste_items(
        &mut self,
        text: &str,
    ) -> usize {
        let items = parse_pasted_items(text);
        let added = items.len();
        self.items.extend(items);
        added
    }
}

fn check_rate(
    config: &RatesConfig,
    category: RateCategory,
    id: &str,
) -> Result<(), FormError> {
    if config.items(category).iter().any(|rate| rate.id == id) {
        Ok(())
    } else {
        Err(FormError::UnknownRate {
            category: category.as_str(),
            id: id.to_string(),
        })
    }
}

/// Reads one `description [sep qty [sep rate]]` line, with `|`, `,` or tab
/// as the separator. The description may be blank; a missing quantity
/// becomes `1`.
pub fn parse_item_line(line: &str) -> LineItem {
    let mut parts = PASTE_DELIMITER.split(line).map(str::trim);
    let desc = parts.next().unwrap_or_default();
    let qty = parts.next().filter(|q| !q.is_empty()).unwrap_or("1");
    let rate = parts.next().unwrap_or_default();
    LineItem::new(desc, qty, rate)
}

/// Splits pasted text into line items, one per non-blank line.
///
/// Lines with an empty description are skipped.
pub fn parse_pasted_items(text: &str) -> Vec<LineItem> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_item_line)
        .filter(|item| !item.desc.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    /// A snapshot that restore would not alter: every defaulted field set
    /// and every config id present.
    fn well_formed(config: &RatesConfig) -> FormSnapshot {
        let mut form = FormState::blank(config, today());
        form.quote_ref = "Q-2041".into();
        form.client_name = "Acme Ltd".into();
        form.proj_name = "Office fit-out".into();
        form.site_addr = "1 High St".into();
        form.days_on_site = "3".into();
        form.issued_by = "J. Smith".into();
        form.items = vec![
            LineItem::new("Desks", "12", "0.75"),
            LineItem::new("Chairs", "40", "0.2"),
        ];
        form.set_labour(config, "l1", "2", "3").unwrap();
        form.set_vehicle(config, "v2", "1", Some("Kent".into())).unwrap();
        form.set_expense(config, "e2", "1").unwrap();
        form.capture(config)
    }

    #[test]
    fn blank_form_has_one_item_and_defaults() {
        let config = RatesConfig::default();
        let form = FormState::blank(&config, today());
        assert_eq!(form.quote_date, "2024-03-15");
        assert_eq!(form.scope_notes, config.default_scope);
        assert_eq!(form.items, vec![LineItem::blank()]);
        assert!(form.quote_ref.is_empty());
    }

    #[test]
    fn capture_covers_every_config_id() {
        let config = RatesConfig::default();
        let snapshot = FormState::blank(&config, today()).capture(&config);
        assert_eq!(snapshot.labour_data.len(), config.labour.len());
        assert_eq!(snapshot.vehicle_data["v1"].area, DEFAULT_AREA);
        assert_eq!(snapshot.expense_data["e1"], "");
        assert_eq!(snapshot.final_total, "£0.00");
    }

    #[test]
    fn capture_prices_final_total() {
        let config = RatesConfig::default();
        let snapshot = well_formed(&config);
        // 2*3*325 + 200 + 340 + 3*15 + 3*75
        assert_eq!(snapshot.final_total, "£2760.00");
        assert_eq!(
            FormState::restore(&snapshot, &config).totals(&config).total_money,
            dec!(2760)
        );
    }

    #[test]
    fn restore_then_capture_round_trips() {
        let config = RatesConfig::default();
        let snapshot = well_formed(&config);
        let restored = FormState::restore(&snapshot, &config);
        assert_eq!(restored.capture(&config), snapshot);
    }

    #[test]
    fn restore_applies_defaults_to_empty_fields() {
        let mut config = RatesConfig::default();
        config.default_issuer = "Estimating Team".into();
        let mut snapshot = FormSnapshot::default();
        snapshot.vehicle_data.insert(
            "v1".into(),
            VehicleEntry {
                qty: "2".into(),
                area: String::new(),
            },
        );

        let form = FormState::restore(&snapshot, &config);
        assert_eq!(form.scope_notes, config.default_scope);
        assert_eq!(form.issued_by, "Estimating Team");
        assert_eq!(form.vehicles["v1"].area, DEFAULT_AREA);
        assert_eq!(form.items, vec![LineItem::blank()]);
    }

    #[test]
    fn restore_defaults_item_quantity() {
        let config = RatesConfig::default();
        let snapshot = FormSnapshot {
            items: vec![LineItem::new("Wardrobe", "", "2")],
            ..FormSnapshot::default()
        };
        let form = FormState::restore(&snapshot, &config);
        assert_eq!(form.items[0].qty, "1");
    }

    #[test]
    fn restore_drops_ids_missing_from_config() {
        let config = RatesConfig::default();
        let mut snapshot = FormSnapshot::default();
        snapshot.labour_data.insert(
            "l99".into(),
            LabourEntry {
                qty: "1".into(),
                days: "1".into(),
            },
        );
        let form = FormState::restore(&snapshot, &config);
        assert!(form.labour.is_empty());
    }

    #[test]
    fn items_can_be_reordered_and_removed() {
        let config = RatesConfig::default();
        let mut form = FormState::blank(&config, today());
        form.items = vec![
            LineItem::new("a", "1", ""),
            LineItem::new("b", "1", ""),
            LineItem::new("c", "1", ""),
        ];

        form.move_item(2, 0).unwrap();
        let order: Vec<_> = form.items.iter().map(|i| i.desc.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);

        assert_eq!(form.remove_item(1).unwrap().desc, "a");
        assert_eq!(form.remove_item(5), Err(FormError::NoSuchItem(5)));
        assert_eq!(form.move_item(0, 9), Err(FormError::NoSuchItem(9)));
    }

    #[test]
    fn rate_inputs_require_a_known_id_in_the_right_table() {
        let config = RatesConfig::default();
        let mut form = FormState::default();
        assert!(form.set_labour(&config, "l2", "1", "2").is_ok());
        assert!(matches!(
            form.set_labour(&config, "v1", "1", "2"),
            Err(FormError::UnknownRate { .. })
        ));
        form.set_vehicle(&config, "v3", "2", None).unwrap();
        assert_eq!(form.vehicles["v3"].area, DEFAULT_AREA);
    }

    #[test]
    fn header_fields_parse_from_names() {
        assert_eq!("client".parse::<HeaderField>(), Ok(HeaderField::Client));
        assert_eq!("daysOnSite".parse::<HeaderField>(), Ok(HeaderField::DaysOnSite));
        assert!("colour".parse::<HeaderField>().is_err());
    }

    #[test]
    fn pasted_lines_split_on_any_delimiter() {
        let items = parse_pasted_items("Desk|2|1.5\nChair, 4\n\n  \nLamp\t\t0.5\n|3|1\n");
        assert_eq!(
            items,
            vec![
                LineItem::new("Desk", "2", "1.5"),
                LineItem::new("Chair", "4", ""),
                LineItem::new("Lamp", "1", "0.5"),
            ]
        );
    }

    #[test]
    fn paste_appends_after_existing_items() {
        let config = RatesConfig::default();
        let mut form = FormState::blank(&config, today());
        assert_eq!(form.paste_items("Desk|2|1.5\nShelf|1|0.25"), 2);
        assert_eq!(form.items.len(), 3);
        assert_eq!(form.items[2].desc, "Shelf");
    }
}

//! Quote pricing.
//!
//! # Buckets
//!
//! | Source          | Contribution                          | Bucket |
//! |-----------------|---------------------------------------|--------|
//! | line items      | `qty × rate`                          | hours  |
//! | labour          | `qty × days × rate`                   | money  |
//! | vehicles        | `qty × rate`                          | money  |
//! | expenses        | `qty × rate`, or `days on site × rate` when charged per day | money |
//!
//! Line items feed the hours bucket even though their rate column looks
//! like money; labour days are derived from it. Scenario totals, VAT and
//! the margin estimate are all derived from the money bucket.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use quote_core::calculations::PricingEngine;
//! use quote_core::{FormSnapshot, LabourEntry, RatesConfig};
//!
//! let config = RatesConfig::default();
//! let mut snapshot = FormSnapshot::default();
//! snapshot.labour_data.insert(
//!     "l1".to_string(),
//!     LabourEntry { qty: "2".to_string(), days: "1".to_string() },
//! );
//!
//! let result = PricingEngine::new(&config).calculate(&snapshot);
//!
//! assert_eq!(result.total_money, dec!(650.00));
//! assert_eq!(result.vat, dec!(130.00));
//! assert_eq!(result.total_with_vat, dec!(780.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{format_fixed, format_money, max, parse_amount, round_dp, round_half_up};
use crate::models::{FormSnapshot, RateCategory, RatesConfig};

/// Assumed labour cost per hour used by the margin estimate.
///
/// Fixed approximation, not part of the admin configuration.
pub const LABOUR_COST_PER_HOUR: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Sums without panicking; totals pin at the `Decimal` bounds instead.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Total for one configured rate row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTotal {
    pub id: String,
    pub category: RateCategory,
    pub total: Decimal,
}

/// Output of [`PricingEngine::calculate`].
///
/// Money fields are rounded to two decimals. Hours and labour days are
/// left unrounded; use the display helpers for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingResult {
    pub total_hours: Decimal,
    pub labour_days: Decimal,
    pub total_money: Decimal,
    pub ooh_total: Decimal,
    pub sat_total: Decimal,
    pub sun_total: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    /// Estimated margin in percent, never negative.
    pub margin_percent: Decimal,
    /// `qty × rate` for each line item, in display order.
    pub line_totals: Vec<Decimal>,
    /// One entry per configured labour, vehicle and expense row.
    pub rows: Vec<RowTotal>,
}

impl PricingResult {
    pub fn hours_display(&self) -> String {
        format_fixed(self.total_hours, 1)
    }

    pub fn labour_days_display(&self) -> String {
        format_fixed(self.labour_days, 2)
    }

    pub fn total_display(&self) -> String {
        format_money(self.total_money)
    }

    pub fn margin_display(&self) -> String {
        format!("{}%", format_fixed(self.margin_percent, 0))
    }

    /// Line total as shown in the items table: one decimal, blank for zero.
    pub fn line_total_display(
        &self,
        index: usize,
    ) -> String {
        match self.line_totals.get(index) {
            Some(total) if !total.is_zero() => format_fixed(*total, 1),
            _ => String::new(),
        }
    }

    pub fn row_total(
        &self,
        id: &str,
    ) -> Option<Decimal> {
        self.rows.iter().find(|r| r.id == id).map(|r| r.total)
    }
}

/// Calculator for quote totals.
#[derive(Debug, Clone)]
pub struct PricingEngine<'a> {
    config: &'a RatesConfig,
}

impl<'a> PricingEngine<'a> {
    pub fn new(config: &'a RatesConfig) -> Self {
        Self { config }
    }

    /// Computes every total for the snapshot.
    ///
    /// Missing or unparseable inputs count as zero. Products too large for
    /// a `Decimal` saturate at its bounds.
    pub fn calculate(
        &self,
        snapshot: &FormSnapshot,
    ) -> PricingResult {
        let days_on_site = parse_amount(&snapshot.days_on_site);

        let line_totals: Vec<Decimal> = snapshot
            .items
            .iter()
            .map(|item| parse_amount(&item.qty).saturating_mul(parse_amount(&item.rate)))
            .collect();
        let total_hours = saturating_sum(line_totals.iter().copied());

        let mut rows = Vec::new();

        for item in &self.config.labour {
            let entry = snapshot.labour_data.get(&item.id);
            let qty = entry.map(|e| parse_amount(&e.qty)).unwrap_or_default();
            let days = entry.map(|e| parse_amount(&e.days)).unwrap_or_default();
            rows.push(RowTotal {
                id: item.id.clone(),
                category: RateCategory::Labour,
                total: qty.saturating_mul(days).saturating_mul(item.rate),
            });
        }

        for item in &self.config.vehicles {
            let qty = snapshot
                .vehicle_data
                .get(&item.id)
                .map(|e| parse_amount(&e.qty))
                .unwrap_or_default();
            rows.push(RowTotal {
                id: item.id.clone(),
                category: RateCategory::Vehicle,
                total: qty.saturating_mul(item.rate),
            });
        }

        for item in &self.config.expenses {
            let total = if item.per_day {
                days_on_site.saturating_mul(item.rate)
            } else {
                let qty = snapshot
                    .expense_data
                    .get(&item.id)
                    .map(|q| parse_amount(q))
                    .unwrap_or_default();
                qty.saturating_mul(item.rate)
            };
            rows.push(RowTotal {
                id: item.id.clone(),
                category: RateCategory::Expense,
                total,
            });
        }

        let total_money = saturating_sum(rows.iter().map(|r| r.total));
        let globals = &self.config.globals;

        let labour_days = total_hours
            .checked_div(globals.day_hours)
            .unwrap_or(Decimal::ZERO);
        let vat = total_money.saturating_mul(globals.vat_rate);

        PricingResult {
            total_hours,
            labour_days,
            total_money: round_half_up(total_money),
            ooh_total: round_half_up(total_money.saturating_mul(globals.ooh_multiplier)),
            sat_total: round_half_up(total_money.saturating_mul(globals.sat_multiplier)),
            sun_total: round_half_up(total_money.saturating_mul(globals.sun_multiplier)),
            vat: round_half_up(vat),
            total_with_vat: round_half_up(total_money.saturating_add(vat)),
            margin_percent: self.margin_percent(total_money, total_hours),
            line_totals,
            rows,
        }
    }

    fn margin_percent(
        &self,
        total_money: Decimal,
        total_hours: Decimal,
    ) -> Decimal {
        if total_money <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let labour_cost = total_hours.saturating_mul(LABOUR_COST_PER_HOUR);
        let margin = total_money
            .saturating_sub(labour_cost)
            .checked_div(total_money)
            .unwrap_or(Decimal::ZERO)
            .saturating_mul(Decimal::ONE_HUNDRED);
        round_dp(max(margin, Decimal::ZERO), 2)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{GlobalConfig, LabourEntry, LineItem, RateItem, VehicleEntry};

    fn config() -> RatesConfig {
        RatesConfig {
            labour: vec![RateItem::new("l1", "Installer", dec!(300))],
            vehicles: vec![RateItem::new("v1", "Van", dec!(200))],
            expenses: vec![
                RateItem::new("e1", "Mileage", dec!(0.90)),
                RateItem::new("e2", "Parking", dec!(75)).per_day(),
            ],
            globals: GlobalConfig::default(),
            ..Default::default()
        }
    }

    fn labour(qty: &str, days: &str) -> LabourEntry {
        LabourEntry {
            qty: qty.to_string(),
            days: days.to_string(),
        }
    }

    fn vehicle(qty: &str) -> VehicleEntry {
        VehicleEntry {
            qty: qty.to_string(),
            ..Default::default()
        }
    }

    fn full_snapshot() -> FormSnapshot {
        let mut snapshot = FormSnapshot {
            days_on_site: "2".to_string(),
            items: vec![LineItem::new("Desks", "4", "1.5"), LineItem::new("Chairs", "10", "0.25")],
            ..Default::default()
        };
        snapshot.labour_data.insert("l1".to_string(), labour("2", "3"));
        snapshot.vehicle_data.insert("v1".to_string(), vehicle("1"));
        snapshot.expense_data.insert("e1".to_string(), "100".to_string());
        snapshot
    }

    #[test]
    fn line_items_feed_the_hours_bucket() {
        let config = config();
        let result = PricingEngine::new(&config).calculate(&full_snapshot());

        assert_eq!(result.total_hours, dec!(8.5));
        assert_eq!(result.line_totals, vec![dec!(6.0), dec!(2.50)]);
    }

    #[test]
    fn money_bucket_sums_labour_vehicles_and_expenses() {
        let config = config();
        let result = PricingEngine::new(&config).calculate(&full_snapshot());

        // labour 2*3*300 + van 200 + mileage 100*0.90 + parking 2 days*75
        assert_eq!(result.total_money, dec!(2240.00));
        assert_eq!(result.row_total("l1"), Some(dec!(1800)));
        assert_eq!(result.row_total("e2"), Some(dec!(150)));
    }

    #[test]
    fn per_day_expense_ignores_entered_quantity() {
        let config = config();
        let mut snapshot = FormSnapshot {
            days_on_site: "3".to_string(),
            ..Default::default()
        };
        snapshot.expense_data.insert("e2".to_string(), "99".to_string());

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.row_total("e2"), Some(dec!(225)));
    }

    #[test]
    fn labour_days_divides_hours_by_day_hours() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.items.push(LineItem::new("Hours", "1", "14.5"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.labour_days, dec!(2));
        assert_eq!(result.labour_days_display(), "2.00");
        assert_eq!(result.hours_display(), "14.5");
    }

    #[test]
    fn zero_day_hours_gives_zero_labour_days() {
        let mut config = config();
        config.globals.day_hours = Decimal::ZERO;
        let mut snapshot = FormSnapshot::default();
        snapshot.items.push(LineItem::new("Hours", "1", "10"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.labour_days, Decimal::ZERO);
    }

    #[test]
    fn non_numeric_inputs_count_as_zero() {
        let config = config();
        let mut snapshot = FormSnapshot {
            days_on_site: "soon".to_string(),
            items: vec![LineItem::new("Odd", "x", ""), LineItem::new("", "", "abc")],
            ..Default::default()
        };
        snapshot.labour_data.insert("l1".to_string(), labour("two", "3"));
        snapshot.vehicle_data.insert("v1".to_string(), vehicle(""));
        snapshot.expense_data.insert("e1".to_string(), "n/a".to_string());

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result, PricingEngine::new(&config).calculate(&FormSnapshot {
            items: vec![LineItem::default(), LineItem::default()],
            ..Default::default()
        }));
        assert_eq!(result.total_money, Decimal::ZERO);
        assert_eq!(result.total_hours, Decimal::ZERO);
    }

    #[test]
    fn doubling_one_quantity_doubles_only_its_contribution() {
        let config = config();
        let base = full_snapshot();
        let mut doubled = base.clone();
        doubled.vehicle_data.insert("v1".to_string(), vehicle("2"));

        let engine = PricingEngine::new(&config);
        let before = engine.calculate(&base);
        let after = engine.calculate(&doubled);

        assert_eq!(after.row_total("v1"), Some(dec!(400)));
        assert_eq!(after.total_money - before.total_money, dec!(200));
        for (a, b) in before.rows.iter().zip(after.rows.iter()) {
            if a.id != "v1" {
                assert_eq!(a.total, b.total, "row {} should not change", a.id);
            }
        }
    }

    #[test]
    fn scenario_totals_scale_linearly() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.vehicle_data.insert("v1".to_string(), vehicle("5"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.total_money, dec!(1000.00));
        assert_eq!(result.ooh_total, dec!(1600.00));
        assert_eq!(result.sat_total, dec!(1750.00));
        assert_eq!(result.sun_total, dec!(2000.00));
    }

    #[test]
    fn vat_and_grand_total() {
        let mut config = config();
        config.globals.vat_rate = dec!(0.20);
        let mut snapshot = FormSnapshot::default();
        snapshot.vehicle_data.insert("v1".to_string(), vehicle("2.5"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.total_money, dec!(500.00));
        assert_eq!(result.vat, dec!(100.00));
        assert_eq!(result.total_with_vat, dec!(600.00));
    }

    #[test]
    fn margin_uses_fixed_hourly_cost() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.vehicle_data.insert("v1".to_string(), vehicle("5"));
        snapshot.items.push(LineItem::new("Fit", "1", "10"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        // (1000 - 10 * 25) / 1000 * 100
        assert_eq!(result.margin_percent, dec!(75));
        assert_eq!(result.margin_display(), "75%");
    }

    #[test]
    fn margin_is_clamped_at_zero() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.vehicle_data.insert("v1".to_string(), vehicle("1"));
        snapshot.items.push(LineItem::new("Fit", "1", "100"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.margin_percent, Decimal::ZERO);
    }

    #[test]
    fn margin_is_zero_without_money() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.items.push(LineItem::new("Fit", "1", "5"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.margin_percent, Decimal::ZERO);
    }

    #[test]
    fn calculation_is_idempotent() {
        let config = config();
        let engine = PricingEngine::new(&config);
        let snapshot = full_snapshot();

        assert_eq!(engine.calculate(&snapshot), engine.calculate(&snapshot));
    }

    #[test]
    fn entries_for_unknown_ids_are_ignored() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.labour_data.insert("l99".to_string(), labour("5", "5"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.total_money, Decimal::ZERO);
        assert_eq!(result.rows.len(), 4);
    }

    #[test]
    fn huge_quantities_saturate_instead_of_overflowing() {
        let config = config();
        let mut snapshot = FormSnapshot {
            items: vec![LineItem::new(
                "Bulk",
                "99999999999999999999",
                "99999999999999999999",
            )],
            ..Default::default()
        };
        snapshot.labour_data.insert("l1".to_string(), labour("1e20", "1e20"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.total_hours, Decimal::MAX);
        assert_eq!(result.total_money, Decimal::MAX);
        assert_eq!(result.ooh_total, Decimal::MAX);
        assert_eq!(result.total_with_vat, Decimal::MAX);
        assert_eq!(result.margin_percent, Decimal::ZERO);
    }

    #[test]
    fn huge_money_without_hours_keeps_full_margin() {
        let config = config();
        let mut snapshot = FormSnapshot::default();
        snapshot.labour_data.insert("l1".to_string(), labour("1e20", "1e20"));

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.row_total("l1"), Some(Decimal::MAX));
        assert_eq!(result.margin_percent, dec!(100));
    }

    #[test]
    fn line_total_display_blanks_zero_rows() {
        let config = config();
        let snapshot = FormSnapshot {
            items: vec![LineItem::new("A", "2", "1.25"), LineItem::blank()],
            ..Default::default()
        };

        let result = PricingEngine::new(&config).calculate(&snapshot);

        assert_eq!(result.line_total_display(0), "2.5");
        assert_eq!(result.line_total_display(1), "");
        assert_eq!(result.line_total_display(7), "");
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::QuoteStatus;

/// Vehicle hire area used when none has been entered.
pub const DEFAULT_AREA: &str = "London";

/// A free-form row from the items table.
///
/// Values are kept as the text the user typed; the pricing engine parses
/// them leniently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub desc: String,
    pub qty: String,
    pub rate: String,
}

impl LineItem {
    pub fn new(
        desc: impl Into<String>,
        qty: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            desc: desc.into(),
            qty: qty.into(),
            rate: rate.into(),
        }
    }

    /// A fresh row as added by the "add item" action.
    pub fn blank() -> Self {
        Self::new("", "1", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabourEntry {
    pub qty: String,
    pub days: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleEntry {
    pub qty: String,
    pub area: String,
}

impl Default for VehicleEntry {
    fn default() -> Self {
        Self {
            qty: String::new(),
            area: DEFAULT_AREA.to_string(),
        }
    }
}

/// Every form field plus the computed total, enough to repopulate the
/// form exactly.
///
/// Field names match the JSON written by earlier versions of the tool so
/// that exported files and stored library entries stay loadable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSnapshot {
    pub quote_ref: String,
    pub quote_date: String,
    pub client_name: String,
    pub proj_name: String,
    pub site_addr: String,
    pub scope_notes: String,
    pub days_on_site: String,
    pub issued_by: String,
    /// Formatted money total at capture time, e.g. `£1234.50`.
    pub final_total: String,
    pub items: Vec<LineItem>,
    pub labour_data: BTreeMap<String, LabourEntry>,
    pub vehicle_data: BTreeMap<String, VehicleEntry>,
    pub expense_data: BTreeMap<String, String>,
    pub status: QuoteStatus,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_legacy_autosave_payload() {
        let json = r#"{
            "quoteRef": "Q100",
            "quoteDate": "2025-03-01",
            "clientName": "Acme",
            "items": [{"desc": "Desks", "qty": "4", "rate": "1.5"}],
            "labourData": {"l1": {"qty": "2", "days": "3"}},
            "vehicleData": {"v1": {"qty": "1"}},
            "expenseData": {"e2": "1"},
            "status": "draft"
        }"#;

        let snapshot: FormSnapshot = serde_json::from_str(json).expect("payload should parse");

        assert_eq!(snapshot.quote_ref, "Q100");
        assert_eq!(snapshot.items, vec![LineItem::new("Desks", "4", "1.5")]);
        assert_eq!(snapshot.labour_data["l1"].days, "3");
        assert_eq!(snapshot.vehicle_data["v1"].area, DEFAULT_AREA);
        assert_eq!(snapshot.expense_data["e2"], "1");
        assert_eq!(snapshot.site_addr, "");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let snapshot = FormSnapshot {
            quote_ref: "Q1".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");

        assert_eq!(value["quoteRef"], "Q1");
        assert!(value.get("labourData").is_some());
        assert_eq!(value["status"], "draft");
    }
}

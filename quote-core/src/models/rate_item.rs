use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which rate table an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateCategory {
    Labour,
    Vehicle,
    Expense,
}

impl RateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labour => "labour",
            Self::Vehicle => "vehicle",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "labour" | "labor" => Some(Self::Labour),
            "vehicle" | "vehicles" => Some(Self::Vehicle),
            "expense" | "expenses" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// A billable category from the admin rate tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateItem {
    pub id: String,
    pub label: String,
    pub rate: Decimal,
    /// Expenses only: charged per day on site instead of per quantity.
    #[serde(default)]
    pub per_day: bool,
}

impl RateItem {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            rate,
            per_day: false,
        }
    }

    pub fn per_day(mut self) -> Self {
        self.per_day = true;
        self
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scalar settings applied uniformly to the money total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    /// Working hours in one labour day.
    pub day_hours: Decimal,
    pub ooh_multiplier: Decimal,
    pub sat_multiplier: Decimal,
    pub sun_multiplier: Decimal,
    /// VAT as a fraction (0.20 for 20%).
    pub vat_rate: Decimal,
    pub margin_target: Decimal,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            day_hours: Decimal::new(725, 2),
            ooh_multiplier: Decimal::new(16, 1),
            sat_multiplier: Decimal::new(175, 2),
            sun_multiplier: Decimal::new(20, 1),
            vat_rate: Decimal::new(20, 2),
            margin_target: Decimal::new(35, 2),
        }
    }
}

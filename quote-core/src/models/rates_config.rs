use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GlobalConfig, RateCategory, RateItem};

pub const DEFAULT_TERMS: &str = "1. All estimates are supplied on the assumption of clear access, use of appropriate size lift, which will accommodate ALL items, for uplift and clear working areas.

2. Waste will be disposed of by a licensed waste carrier and disposed of as per regulations and recycled where possible. Pallets will be returned to the sender or recycled where possible.

3. Any uplift required via stairs, access issues, product changes, phased deliveries, product/delivery split by floor will require a new estimate to be raised to suit.

4. Out Of Hours is considered to be 18:00 - 07:00 Monday to Friday (NOT incl. Bank holidays). Saturday, Sunday & Bank Holiday works will require re-estimating.

5. Parking - Parking will be charged at the value of PCN, UNLESS on-site parking is made available for the duration of the task.";

pub const DEFAULT_SCOPE: &str = "Installation of products as detailed in the supplied Works Order.";

/// Rate tables and global multipliers used by the pricing engine.
///
/// This is the blob persisted under the local `config` key and in the
/// remote shared settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatesConfig {
    pub labour: Vec<RateItem>,
    pub vehicles: Vec<RateItem>,
    pub expenses: Vec<RateItem>,
    pub globals: GlobalConfig,
    pub terms: String,
    pub default_scope: String,
    pub default_issuer: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            labour: vec![
                RateItem::new("l1", "Installer + Vehicle", Decimal::from(325)),
                RateItem::new("l2", "2 Person Team", Decimal::from(550)),
                RateItem::new("l3", "Installer (On Foot)", Decimal::from(185)),
                RateItem::new("l4", "Supervisor", Decimal::from(220)),
                RateItem::new("l5", "Custom/Snagging", Decimal::from(750)),
            ],
            vehicles: vec![
                RateItem::new("v1", "SWB Van", Decimal::from(170)),
                RateItem::new("v2", "XLWB Van", Decimal::from(200)),
                RateItem::new("v3", "Luton Van", Decimal::from(230)),
                RateItem::new("v4", "7.5T Truck", Decimal::from(540)),
                RateItem::new("v5", "18T Truck", Decimal::from(720)),
            ],
            expenses: vec![
                RateItem::new("e1", "Additional Mileage", Decimal::new(90, 2)),
                RateItem::new("e2", "Waste Disposal", Decimal::from(340)),
                RateItem::new("e3", "ULEZ/City Charge", Decimal::from(15)).per_day(),
                RateItem::new("e4", "Parking", Decimal::from(75)).per_day(),
            ],
            globals: GlobalConfig::default(),
            terms: DEFAULT_TERMS.to_string(),
            default_scope: DEFAULT_SCOPE.to_string(),
            default_issuer: String::new(),
        }
    }
}

impl RatesConfig {
    pub fn items(
        &self,
        category: RateCategory,
    ) -> &[RateItem] {
        match category {
            RateCategory::Labour => &self.labour,
            RateCategory::Vehicle => &self.vehicles,
            RateCategory::Expense => &self.expenses,
        }
    }

    pub fn items_mut(
        &mut self,
        category: RateCategory,
    ) -> &mut Vec<RateItem> {
        match category {
            RateCategory::Labour => &mut self.labour,
            RateCategory::Vehicle => &mut self.vehicles,
            RateCategory::Expense => &mut self.expenses,
        }
    }

    /// Finds an item by id across all three tables.
    pub fn find(
        &self,
        id: &str,
    ) -> Option<(RateCategory, &RateItem)> {
        [
            RateCategory::Labour,
            RateCategory::Vehicle,
            RateCategory::Expense,
        ]
        .into_iter()
        .find_map(|category| {
            self.items(category)
                .iter()
                .find(|item| item.id == id)
                .map(|item| (category, item))
        })
    }

    pub fn find_mut(
        &mut self,
        id: &str,
    ) -> Option<&mut RateItem> {
        self.labour
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.expenses.iter_mut())
            .find(|item| item.id == id)
    }
}

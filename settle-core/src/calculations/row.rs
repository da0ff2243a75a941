//! Per-line settlement figures.
//!
//! | Figure            | Formula                                        |
//! |-------------------|------------------------------------------------|
//! | secondary share   | floor(unit price × quantity × 0.5)             |
//! | commission        | (quantity + other quantity) × commission rate  |
//! | AP amount         | (quantity + other quantity) × AP rate          |

use serde::{Deserialize, Serialize};

use super::common::{SECONDARY_SHARE_RATIO, apply_ratio_floor};
use crate::models::{LineItem, OperatorSettings, RowId};

/// Revenue share of one line for the secondary operator.
///
/// # Examples
///
/// ```
/// use settle_core::calculations::row::secondary_share;
///
/// assert_eq!(secondary_share(100, 3), 150);
/// assert_eq!(secondary_share(101, 3), 151);
/// ```
pub fn secondary_share(
    unit_price: i64,
    quantity: u32,
) -> i64 {
    apply_ratio_floor(line_revenue(unit_price, quantity), SECONDARY_SHARE_RATIO)
}

/// Gross revenue of one line (`unit price × quantity`).
pub fn line_revenue(
    unit_price: i64,
    quantity: u32,
) -> i64 {
    unit_price.saturating_mul(i64::from(quantity))
}

/// Derived figures for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowResult {
    pub row: RowId,
    pub unit_price: i64,
    pub primary_quantity: u32,
    pub other_quantity: u32,
    pub secondary_share: i64,
    pub commission: i64,
    pub ap_amount: i64,
}

impl RowResult {
    pub fn is_contributing(&self) -> bool {
        self.primary_quantity > 0 || self.other_quantity > 0
    }

    /// `unit price × primary quantity`, the basis of the cumulative figure.
    pub fn revenue(&self) -> i64 {
        line_revenue(self.unit_price, self.primary_quantity)
    }

    pub fn combined_quantity(&self) -> i64 {
        i64::from(self.primary_quantity) + i64::from(self.other_quantity)
    }

    /// AP amount plus commission for this line.
    pub fn secondary_total(&self) -> i64 {
        self.ap_amount.saturating_add(self.commission)
    }
}

/// Computes [`RowResult`]s for one operator's rates.
///
/// The engine never fails: rates below zero are treated as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowEngine {
    settings: OperatorSettings,
}

impl RowEngine {
    pub fn new(settings: OperatorSettings) -> Self {
        Self {
            settings: settings.clamped(),
        }
    }

    pub fn settings(&self) -> OperatorSettings {
        self.settings
    }

    pub fn compute(
        &self,
        item: &LineItem,
    ) -> RowResult {
        let combined = item.combined_quantity();

        RowResult {
            row: item.row,
            unit_price: item.unit_price,
            primary_quantity: item.primary_quantity,
            other_quantity: item.other_quantity,
            secondary_share: secondary_share(item.unit_price, item.primary_quantity),
            commission: combined.saturating_mul(self.settings.commission_rate),
            ap_amount: combined.saturating_mul(self.settings.ap_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(
        unit_price: i64,
        primary_quantity: u32,
        other_quantity: u32,
    ) -> LineItem {
        LineItem {
            row: RowId(0),
            unit_price,
            primary_quantity,
            other_quantity,
        }
    }

    #[test]
    fn secondary_share_floors_odd_products() {
        assert_eq!(secondary_share(999, 3), 1498);
        assert_eq!(secondary_share(101, 3), 151);
        assert_eq!(secondary_share(100, 3), 150);
        assert_eq!(secondary_share(1, 1), 0);
    }

    #[test]
    fn secondary_share_matches_floor_over_a_grid() {
        for price in [0_i64, 1, 7, 99, 100, 101, 999, 1000, 12345] {
            for qty in [0_u32, 1, 2, 3, 10, 11] {
                let product = price * i64::from(qty);
                assert_eq!(secondary_share(price, qty), product / 2, "price={price} qty={qty}");
            }
        }
    }

    #[test]
    fn compute_derives_all_figures() {
        let engine = RowEngine::new(OperatorSettings::new(50, 30));

        let result = engine.compute(&item(1000, 4, 1));

        assert_eq!(result.secondary_share, 2000);
        assert_eq!(result.commission, 250);
        assert_eq!(result.ap_amount, 150);
        assert_eq!(result.secondary_total(), 400);
        assert_eq!(result.revenue(), 4000);
        assert!(result.is_contributing());
    }

    #[test]
    fn other_quantity_only_feeds_commission_and_ap() {
        let engine = RowEngine::new(OperatorSettings::new(50, 30));

        let result = engine.compute(&item(1000, 0, 2));

        assert_eq!(result.secondary_share, 0);
        assert_eq!(result.revenue(), 0);
        assert_eq!(result.commission, 100);
        assert_eq!(result.ap_amount, 60);
        assert!(result.is_contributing());
    }

    #[test]
    fn zero_line_is_computed_but_not_contributing() {
        let engine = RowEngine::new(OperatorSettings::new(50, 30));

        let result = engine.compute(&item(1000, 0, 0));

        assert_eq!(result.secondary_share, 0);
        assert_eq!(result.commission, 0);
        assert_eq!(result.ap_amount, 0);
        assert!(!result.is_contributing());
    }

    #[test]
    fn default_engine_uses_zero_rates() {
        let result = RowEngine::default().compute(&item(1000, 4, 1));

        assert_eq!(result.commission, 0);
        assert_eq!(result.ap_amount, 0);
        assert_eq!(result.secondary_share, 2000);
    }

    #[test]
    fn negative_rates_are_treated_as_zero() {
        let engine = RowEngine::new(OperatorSettings::new(-50, -30));

        let result = engine.compute(&item(1000, 4, 1));

        assert_eq!(engine.settings(), OperatorSettings::default());
        assert_eq!(result.commission, 0);
        assert_eq!(result.ap_amount, 0);
    }
}

//! Folds every line of a calculator instance into settlement totals.
//!
//! # Settlement split
//!
//! The expense entered on the form is reimbursed to the primary operator
//! and absorbed by the secondary operator:
//!
//! | Figure                         | Formula                               |
//! |--------------------------------|---------------------------------------|
//! | final total (primary)          | total secondary share + expense       |
//! | send amount (to secondary)     | total secondary share − expense       |
//! | combined secondary total       | total AP amount + total commission    |
//! | net secondary after expense    | combined secondary total − expense    |
//!
//! The two first figures always differ by exactly twice the expense.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use settle_core::calculations::CalculatorAggregate;
//! use settle_core::{CalculatorInstance, Catalog, FieldChange, OperatorId, OperatorSettings, RowId};
//!
//! let catalog = Catalog::from_prices([1000]);
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let mut instance = CalculatorInstance::new(OperatorId::new(1).unwrap(), &catalog, date);
//! instance.apply(FieldChange::Quantity { row: RowId(0), text: "4".into() });
//! instance.apply(FieldChange::Expense("200".into()));
//!
//! let result = CalculatorAggregate::new(OperatorSettings::new(50, 30)).calculate(&instance);
//!
//! assert_eq!(result.final_total_primary, 2200);
//! assert_eq!(result.send_amount_to_secondary, 1800);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::row::{RowEngine, RowResult};
use crate::models::{CalculatorInstance, OperatorSettings, RowId};

/// Primary-operator projection of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRowView {
    pub row: RowId,
    pub unit_price: i64,
    pub quantity: u32,
    pub share: i64,
}

/// Secondary-operator projection of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryRowView {
    pub row: RowId,
    pub unit_price: i64,
    pub quantity: u32,
    pub other: u32,
    pub commission: i64,
    pub ap_amount: i64,
}

/// Totals for one calculator instance. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Every line in catalog order, contributing or not.
    pub rows: Vec<RowResult>,

    /// Σ primary quantity.
    pub total_quantity: i64,
    /// Σ (primary quantity + other quantity).
    pub total_combined_quantity: i64,
    /// Σ unit price × primary quantity over contributing lines.
    pub cumulative_revenue: i64,

    pub total_secondary_share: i64,
    pub total_commission: i64,
    pub total_ap_amount: i64,

    pub expense: i64,
    pub final_total_primary: i64,
    pub send_amount_to_secondary: i64,
    pub combined_secondary_total: i64,
    pub net_secondary_after_expense: i64,
}

impl AggregateResult {
    /// Lines with a non-zero quantity, in catalog order.
    pub fn contributing_rows(&self) -> impl Iterator<Item = &RowResult> {
        self.rows.iter().filter(|row| row.is_contributing())
    }

    pub fn primary_view(&self) -> Vec<PrimaryRowView> {
        self.rows
            .iter()
            .map(|row| PrimaryRowView {
                row: row.row,
                unit_price: row.unit_price,
                quantity: row.primary_quantity,
                share: row.secondary_share,
            })
            .collect()
    }

    pub fn secondary_view(&self) -> Vec<SecondaryRowView> {
        self.rows
            .iter()
            .map(|row| SecondaryRowView {
                row: row.row,
                unit_price: row.unit_price,
                quantity: row.primary_quantity,
                other: row.other_quantity,
                commission: row.commission,
                ap_amount: row.ap_amount,
            })
            .collect()
    }
}

/// Sums at the `i64` bounds instead of overflowing.
fn saturating_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Calculator for an instance's totals and settlement split.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorAggregate {
    engine: RowEngine,
}

impl CalculatorAggregate {
    pub fn new(settings: OperatorSettings) -> Self {
        Self {
            engine: RowEngine::new(settings),
        }
    }

    /// Recomputes every figure from scratch; repeated calls with the same
    /// inputs return equal results.
    pub fn calculate(
        &self,
        instance: &CalculatorInstance,
    ) -> AggregateResult {
        let rows: Vec<RowResult> = instance
            .line_items()
            .iter()
            .map(|item| self.engine.compute(item))
            .collect();

        let total_quantity = saturating_total(rows.iter().map(|r| i64::from(r.primary_quantity)));
        let total_combined_quantity = saturating_total(rows.iter().map(RowResult::combined_quantity));
        let cumulative_revenue = saturating_total(
            rows.iter()
                .filter(|r| r.is_contributing())
                .map(RowResult::revenue),
        );
        let total_secondary_share = saturating_total(rows.iter().map(|r| r.secondary_share));
        let total_commission = saturating_total(rows.iter().map(|r| r.commission));
        let total_ap_amount = saturating_total(rows.iter().map(|r| r.ap_amount));

        let expense = instance.expense;
        let combined_secondary_total = total_ap_amount.saturating_add(total_commission);

        let result = AggregateResult {
            total_quantity,
            total_combined_quantity,
            cumulative_revenue,
            total_secondary_share,
            total_commission,
            total_ap_amount,
            expense,
            final_total_primary: total_secondary_share.saturating_add(expense),
            send_amount_to_secondary: total_secondary_share.saturating_sub(expense),
            combined_secondary_total,
            net_secondary_after_expense: combined_secondary_total.saturating_sub(expense),
            rows,
        };

        debug!(
            operator = %instance.operator_id,
            total_quantity = result.total_quantity,
            total_secondary_share = result.total_secondary_share,
            send_amount = result.send_amount_to_secondary,
            "instance totals recomputed"
        );

        result
    }
}

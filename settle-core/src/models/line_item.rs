use serde::{Deserialize, Serialize};

use super::catalog::{CatalogEntry, RowId};

/// One catalog row inside a calculator instance. Only the two quantities change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub row: RowId,
    pub unit_price: i64,
    /// Units handled by the secondary operator.
    pub primary_quantity: u32,
    /// Units handled by a third party; counts toward commission and AP only.
    pub other_quantity: u32,
}

impl LineItem {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            row: entry.row,
            unit_price: entry.unit_price,
            primary_quantity: 0,
            other_quantity: 0,
        }
    }

    /// A line shows up in report detail only when one of its quantities is set.
    pub fn is_contributing(&self) -> bool {
        self.primary_quantity > 0 || self.other_quantity > 0
    }

    pub fn combined_quantity(&self) -> i64 {
        i64::from(self.primary_quantity) + i64::from(self.other_quantity)
    }
}

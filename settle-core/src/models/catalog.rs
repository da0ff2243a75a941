use std::fmt;

use serde::{Deserialize, Serialize};

/// Prices used when no catalog file is configured.
pub const DEFAULT_UNIT_PRICES: [i64; 8] = [3000, 5000, 8000, 10000, 15000, 20000, 30000, 50000];

/// Stable identifier of a catalog row, shared by the primary and secondary views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub row: RowId,
    pub unit_price: i64,
}

/// Ordered, fixed list of priced rows offered to every calculator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog, assigning row ids by position.
    pub fn from_prices<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let entries = prices
            .into_iter()
            .enumerate()
            .map(|(index, unit_price)| CatalogEntry {
                row: RowId(index),
                unit_price,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(
        &self,
        row: RowId,
    ) -> Option<&CatalogEntry> {
        self.entries.get(row.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_prices(DEFAULT_UNIT_PRICES)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_prices_assigns_positional_row_ids() {
        let catalog = Catalog::from_prices([1000, 2500]);

        assert_eq!(
            catalog.entries(),
            &[
                CatalogEntry {
                    row: RowId(0),
                    unit_price: 1000
                },
                CatalogEntry {
                    row: RowId(1),
                    unit_price: 2500
                },
            ]
        );
        assert_eq!(catalog.get(RowId(1)).map(|e| e.unit_price), Some(2500));
        assert_eq!(catalog.get(RowId(2)), None);
    }

    #[test]
    fn default_catalog_uses_default_prices() {
        let catalog = Catalog::default();

        assert_eq!(catalog.len(), DEFAULT_UNIT_PRICES.len());
        assert_eq!(catalog.entries()[0].unit_price, 3000);
    }
}

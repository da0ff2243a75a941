use std::io::Read;

use serde::Deserialize;
use settle_core::Catalog;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a price catalog.
#[derive(Debug, Error)]
pub enum CatalogLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Negative unit price {price} on line {line}")]
    NegativePrice { line: u64, price: i64 },

    #[error("Catalog has no rows")]
    Empty,
}

impl From<csv::Error> for CatalogLoaderError {
    fn from(err: csv::Error) -> Self {
        CatalogLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a catalog CSV file. The header `unit_price` is
/// required; rows become catalog lines in file order.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct CatalogRecord {
    pub unit_price: i64,
}

/// Loader for price catalogs from CSV files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse catalog records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CatalogRecord>, CatalogLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CatalogRecord = result?;
            if record.unit_price < 0 {
                // header is line 1
                let line = records.len() as u64 + 2;
                return Err(CatalogLoaderError::NegativePrice {
                    line,
                    price: record.unit_price,
                });
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Parse and build a [`Catalog`]; an empty file is an error.
    pub fn load<R: Read>(reader: R) -> Result<Catalog, CatalogLoaderError> {
        let records = Self::parse(reader)?;
        if records.is_empty() {
            return Err(CatalogLoaderError::Empty);
        }
        debug!(rows = records.len(), "catalog loaded");
        Ok(Catalog::from_prices(records.iter().map(|r| r.unit_price)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use settle_core::RowId;

    use super::*;

    #[test]
    fn parse_reads_prices_in_order() {
        let csv = "unit_price\n1000\n 2500 \n999\n";

        let result = CatalogLoader::parse(csv.as_bytes()).unwrap();

        let prices: Vec<i64> = result.iter().map(|r| r.unit_price).collect();
        assert_eq!(prices, vec![1000, 2500, 999]);
    }

    #[test]
    fn load_assigns_row_ids_by_position() {
        let catalog = CatalogLoader::load("unit_price\n1000\n2000\n".as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(RowId(1)).map(|e| e.unit_price), Some(2000));
    }

    #[test]
    fn negative_price_reports_line() {
        let result = CatalogLoader::parse("unit_price\n1000\n-5\n".as_bytes());

        assert!(matches!(
            result,
            Err(CatalogLoaderError::NegativePrice { line: 3, price: -5 })
        ));
    }

    #[test]
    fn header_only_file_is_empty_error() {
        let result = CatalogLoader::load("unit_price\n".as_bytes());

        assert!(matches!(result, Err(CatalogLoaderError::Empty)));
    }

    #[test]
    fn non_numeric_price_is_parse_error() {
        let result = CatalogLoader::parse("unit_price\nfree\n".as_bytes());

        assert!(matches!(result, Err(CatalogLoaderError::CsvParse(_))));
    }
}

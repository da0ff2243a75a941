use std::io::Read;

use serde::Deserialize;
use settle_core::input::coerce_rate;
use settle_core::{
    CalculatorInstance, ChangeEffect, FieldChange, InvalidOperatorId, OperatorId, OperatorSettings,
    RowId, SessionContext, SettingsError, SettingsService,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading quantity or settings sheets.
#[derive(Debug, Error)]
pub enum SheetLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid operator on line {line}: {source}")]
    InvalidOperator {
        line: u64,
        #[source]
        source: InvalidOperatorId,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<csv::Error> for SheetLoaderError {
    fn from(err: csv::Error) -> Self {
        SheetLoaderError::CsvParse(err.to_string())
    }
}

fn read_records<R, T>(reader: R) -> Result<Vec<T>, SheetLoaderError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for result in csv_reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

// ============================================================================
// Quantities
// ============================================================================

/// One line of a quantity sheet: `row,quantity,other`.
///
/// `row` is the zero-based catalog row. Quantities stay raw text and are
/// coerced the same way as form input; `other` may be omitted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QuantityRecord {
    pub row: usize,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub other: String,
}

impl QuantityRecord {
    pub fn changes(&self) -> [FieldChange; 2] {
        [
            FieldChange::Quantity {
                row: RowId(self.row),
                text: self.quantity.clone(),
            },
            FieldChange::OtherQuantity {
                row: RowId(self.row),
                text: self.other.clone(),
            },
        ]
    }
}

pub struct QuantitySheetLoader;

impl QuantitySheetLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<QuantityRecord>, SheetLoaderError> {
        read_records(reader)
    }

    /// Applies every record to `instance` and returns how many rows matched
    /// a catalog line. Rows outside the catalog are skipped.
    pub fn apply(
        instance: &mut CalculatorInstance,
        records: &[QuantityRecord],
    ) -> usize {
        let mut applied = 0;
        for record in records {
            let effects = record.changes().map(|change| instance.apply(change));
            if effects.iter().all(|effect| *effect != ChangeEffect::Ignored) {
                applied += 1;
            } else {
                debug!(row = record.row, "quantity record outside catalog skipped");
            }
        }
        applied
    }
}

// ============================================================================
// Operator settings
// ============================================================================

/// One line of a settings sheet: `operator_id,commission_rate,ap_rate`.
/// Rates that do not parse become 0.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SettingsRecord {
    pub operator_id: i64,
    #[serde(default)]
    pub commission_rate: String,
    #[serde(default)]
    pub ap_rate: String,
}

impl SettingsRecord {
    pub fn settings(&self) -> OperatorSettings {
        OperatorSettings::new(coerce_rate(&self.commission_rate), coerce_rate(&self.ap_rate))
    }
}

pub struct SettingsSheetLoader;

impl SettingsSheetLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SettingsRecord>, SheetLoaderError> {
        read_records(reader)
    }

    /// Validates every operator id, then saves all entries in one gated
    /// write. Nothing is written when any line is invalid or the session
    /// lacks permission.
    pub async fn load(
        service: &SettingsService,
        ctx: &SessionContext,
        records: &[SettingsRecord],
    ) -> Result<usize, SheetLoaderError> {
        let entries = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                OperatorId::try_from(record.operator_id)
                    .map(|id| (id, record.settings()))
                    .map_err(|source| SheetLoaderError::InvalidOperator {
                        line: index as u64 + 2,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = entries.len();
        service.save_all(ctx, entries).await?;
        info!(count, "operator settings imported");
        Ok(count)
    }
}

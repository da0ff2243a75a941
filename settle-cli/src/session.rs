//! TOML snapshots of calculator instances.
//!
//! A session file keeps form input exactly as typed so that reloading it
//! goes through the same lenient coercion as live edits:
//!
//! ```toml
//! [[operator]]
//! id = 1
//! staff_name = "Tanaka"
//! counterparty_name = "Sato"
//! date = "2024-05-01"
//! expense = "200"
//!
//! [[operator.line]]
//! row = 0
//! quantity = "4"
//! other = "1"
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settle_core::{CalculatorInstance, Catalog, DATE_FORMAT, FieldChange, OperatorId, RowId};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("cannot access session '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize session: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("operator {0} appears more than once")]
    DuplicateOperator(OperatorId),
}

/// Raw quantities of one catalog row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSheet {
    pub row: usize,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub other: String,
}

/// Raw form input of one calculator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSheet {
    pub id: OperatorId,
    #[serde(default)]
    pub staff_name: String,
    #[serde(default)]
    pub counterparty_name: String,
    /// `None` means "today" when the instance is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub expense: String,
    #[serde(default, rename = "line")]
    pub lines: Vec<LineSheet>,
}

impl OperatorSheet {
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            staff_name: String::new(),
            counterparty_name: String::new(),
            date: None,
            expense: String::new(),
            lines: Vec::new(),
        }
    }

    /// Replays the stored input onto a fresh instance.
    pub fn to_instance(
        &self,
        catalog: &Catalog,
        today: NaiveDate,
    ) -> CalculatorInstance {
        let mut instance = CalculatorInstance::new(self.id, catalog, today);

        let mut changes = vec![
            FieldChange::StaffName(self.staff_name.clone()),
            FieldChange::CounterpartyName(self.counterparty_name.clone()),
            FieldChange::Expense(self.expense.clone()),
        ];
        if let Some(date) = &self.date {
            changes.push(FieldChange::SettlementDate(date.clone()));
        }
        for line in &self.lines {
            changes.push(FieldChange::Quantity {
                row: RowId(line.row),
                text: line.quantity.clone(),
            });
            changes.push(FieldChange::OtherQuantity {
                row: RowId(line.row),
                text: line.other.clone(),
            });
        }

        for change in changes {
            instance.apply(change);
        }
        instance
    }

    /// Captures an instance; only lines with a quantity are written.
    pub fn from_instance(instance: &CalculatorInstance) -> Self {
        let lines = instance
            .line_items()
            .iter()
            .filter(|item| item.is_contributing())
            .map(|item| LineSheet {
                row: item.row.0,
                quantity: item.primary_quantity.to_string(),
                other: item.other_quantity.to_string(),
            })
            .collect();

        Self {
            id: instance.operator_id,
            staff_name: instance.staff_name.clone(),
            counterparty_name: instance.counterparty_name.clone(),
            date: Some(
                instance
                    .settlement_date
                    .map(|date| date.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            expense: instance.expense.to_string(),
            lines,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default, rename = "operator")]
    pub operators: Vec<OperatorSheet>,
}

impl SessionFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, SessionFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| SessionFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let session = Self::parse(&content).map_err(|source| SessionFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        session.validate()?;
        debug!(path = %path.display(), operators = session.operators.len(), "session loaded");
        Ok(session)
    }

    /// Like [`SessionFile::load`], but a missing file is an empty session.
    pub fn load_or_default(path: &Path) -> Result<Self, SessionFileError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, SessionFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(
        &self,
        path: &Path,
    ) -> Result<(), SessionFileError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| SessionFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SessionFileError> {
        let mut seen = BTreeSet::new();
        for sheet in &self.operators {
            if !seen.insert(sheet.id) {
                return Err(SessionFileError::DuplicateOperator(sheet.id));
            }
        }
        Ok(())
    }

    pub fn sheet(
        &self,
        id: OperatorId,
    ) -> Option<&OperatorSheet> {
        self.operators.iter().find(|sheet| sheet.id == id)
    }

    /// Replaces the sheet for the same operator, or appends and keeps the
    /// list ordered by operator id.
    pub fn upsert(
        &mut self,
        sheet: OperatorSheet,
    ) {
        match self.operators.iter_mut().find(|s| s.id == sheet.id) {
            Some(existing) => *existing = sheet,
            None => {
                self.operators.push(sheet);
                self.operators.sort_by_key(|s| s.id);
            }
        }
    }
}

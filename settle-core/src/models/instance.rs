use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{Catalog, RowId};
use super::line_item::LineItem;
use super::operator::OperatorId;
use crate::input::{coerce_expense, coerce_quantity};

/// Fallback shown as the preview title while no staff name is entered.
pub const PREVIEW_TITLE_FALLBACK: &str = "担当者A";

/// Date format used by settlement-date fields and report headers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single edit coming from the calculator form.
///
/// Numeric fields carry the raw text the user typed; coercion happens when
/// the change is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldChange {
    Quantity { row: RowId, text: String },
    OtherQuantity { row: RowId, text: String },
    Expense(String),
    StaffName(String),
    CounterpartyName(String),
    SettlementDate(String),
}

/// What an applied change invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEffect {
    /// Quantities or expense changed; totals and report must be rebuilt.
    Totals,
    /// Only report labels changed; totals are unaffected but the report is rebuilt.
    Labels,
    /// The change referenced a row that does not exist.
    Ignored,
}

/// One operator's working calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorInstance {
    pub operator_id: OperatorId,
    pub staff_name: String,
    pub counterparty_name: String,
    pub settlement_date: Option<NaiveDate>,
    pub expense: i64,
    line_items: Vec<LineItem>,
}

impl CalculatorInstance {
    /// Creates an empty instance with one line per catalog row.
    pub fn new(
        operator_id: OperatorId,
        catalog: &Catalog,
        settlement_date: NaiveDate,
    ) -> Self {
        Self {
            operator_id,
            staff_name: String::new(),
            counterparty_name: String::new(),
            settlement_date: Some(settlement_date),
            expense: 0,
            line_items: catalog.entries().iter().map(LineItem::from_entry).collect(),
        }
    }

    /// Lines in catalog order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(
        &self,
        row: RowId,
    ) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.row == row)
    }

    pub fn line_item_mut(
        &mut self,
        row: RowId,
    ) -> Option<&mut LineItem> {
        self.line_items.iter_mut().find(|item| item.row == row)
    }

    /// Applies one form edit.
    pub fn apply(
        &mut self,
        change: FieldChange,
    ) -> ChangeEffect {
        match change {
            FieldChange::Quantity { row, text } => match self.line_item_mut(row) {
                Some(item) => {
                    item.primary_quantity = coerce_quantity(&text);
                    ChangeEffect::Totals
                }
                None => self.unknown_row(row),
            },
            FieldChange::OtherQuantity { row, text } => match self.line_item_mut(row) {
                Some(item) => {
                    item.other_quantity = coerce_quantity(&text);
                    ChangeEffect::Totals
                }
                None => self.unknown_row(row),
            },
            FieldChange::Expense(text) => {
                self.expense = coerce_expense(&text);
                ChangeEffect::Totals
            }
            FieldChange::StaffName(name) => {
                self.staff_name = name;
                ChangeEffect::Labels
            }
            FieldChange::CounterpartyName(name) => {
                self.counterparty_name = name;
                ChangeEffect::Labels
            }
            FieldChange::SettlementDate(text) => {
                self.settlement_date = parse_settlement_date(&text);
                ChangeEffect::Labels
            }
        }
    }

    /// Resets every user-entered field; the date goes back to `today`.
    pub fn clear(
        &mut self,
        today: NaiveDate,
    ) {
        self.staff_name.clear();
        self.counterparty_name.clear();
        self.settlement_date = Some(today);
        self.expense = 0;
        for item in &mut self.line_items {
            item.primary_quantity = 0;
            item.other_quantity = 0;
        }
    }

    pub fn preview_title(&self) -> &str {
        if self.staff_name.is_empty() {
            PREVIEW_TITLE_FALLBACK
        } else {
            &self.staff_name
        }
    }

    fn unknown_row(
        &self,
        row: RowId,
    ) -> ChangeEffect {
        debug!(operator = %self.operator_id, %row, "change for unknown catalog row ignored");
        ChangeEffect::Ignored
    }
}

/// Empty or malformed date text clears the date instead of failing.
fn parse_settlement_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(input = %text, "unparseable settlement date: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn instance() -> CalculatorInstance {
        CalculatorInstance::new(
            OperatorId::new(1).unwrap(),
            &Catalog::from_prices([1000, 2000]),
            date("2024-05-01"),
        )
    }

    #[test]
    fn new_mirrors_catalog_rows() {
        let instance = instance();

        let rows: Vec<_> = instance.line_items().iter().map(|i| (i.row, i.unit_price)).collect();
        assert_eq!(rows, vec![(RowId(0), 1000), (RowId(1), 2000)]);
        assert!(instance.line_items().iter().all(|i| !i.is_contributing()));
        assert_eq!(instance.settlement_date, Some(date("2024-05-01")));
    }

    #[test]
    fn quantity_change_is_coerced() {
        let mut instance = instance();

        let effect = instance.apply(FieldChange::Quantity {
            row: RowId(1),
            text: "-3".to_string(),
        });
        assert_eq!(effect, ChangeEffect::Totals);
        assert_eq!(instance.line_item(RowId(1)).unwrap().primary_quantity, 0);

        instance.apply(FieldChange::OtherQuantity {
            row: RowId(1),
            text: "2x".to_string(),
        });
        assert_eq!(instance.line_item(RowId(1)).unwrap().other_quantity, 2);
    }

    #[test]
    fn unknown_row_is_ignored() {
        let mut instance = instance();
        let before = instance.clone();

        let effect = instance.apply(FieldChange::Quantity {
            row: RowId(9),
            text: "1".to_string(),
        });

        assert_eq!(effect, ChangeEffect::Ignored);
        assert_eq!(instance, before);
    }

    #[test]
    fn label_changes_do_not_touch_totals() {
        let mut instance = instance();

        assert_eq!(
            instance.apply(FieldChange::StaffName("Tanaka".to_string())),
            ChangeEffect::Labels
        );
        assert_eq!(
            instance.apply(FieldChange::SettlementDate("not a date".to_string())),
            ChangeEffect::Labels
        );
        assert_eq!(instance.staff_name, "Tanaka");
        assert_eq!(instance.settlement_date, None);
    }

    #[test]
    fn expense_keeps_negative_values() {
        let mut instance = instance();

        instance.apply(FieldChange::Expense("-150".to_string()));

        assert_eq!(instance.expense, -150);
    }

    #[test]
    fn clear_resets_fields_and_date() {
        let mut instance = instance();
        instance.apply(FieldChange::StaffName("Tanaka".to_string()));
        instance.apply(FieldChange::Expense("200".to_string()));
        instance.apply(FieldChange::Quantity {
            row: RowId(0),
            text: "4".to_string(),
        });

        instance.clear(date("2024-06-30"));

        assert_eq!(instance.staff_name, "");
        assert_eq!(instance.expense, 0);
        assert_eq!(instance.settlement_date, Some(date("2024-06-30")));
        assert!(instance.line_items().iter().all(|i| !i.is_contributing()));
    }

    #[test]
    fn preview_title_falls_back() {
        let mut instance = instance();
        assert_eq!(instance.preview_title(), "担当者A");

        instance.apply(FieldChange::StaffName("Sato".to_string()));
        assert_eq!(instance.preview_title(), "Sato");
    }
}

mod catalog;
mod instance;
mod line_item;
mod operator;

pub use catalog::{Catalog, CatalogEntry, DEFAULT_UNIT_PRICES, RowId};
pub use instance::{CalculatorInstance, ChangeEffect, DATE_FORMAT, FieldChange, PREVIEW_TITLE_FALLBACK};
pub use line_item::LineItem;
pub use operator::{InvalidOperatorId, OperatorId, OperatorSettings, OperatorSettingsRecord};

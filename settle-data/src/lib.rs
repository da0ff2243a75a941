mod catalog;
mod sheets;

pub use catalog::{CatalogLoader, CatalogLoaderError, CatalogRecord};
pub use sheets::{
    QuantityRecord, QuantitySheetLoader, SettingsRecord, SettingsSheetLoader, SheetLoaderError,
};

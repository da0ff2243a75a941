pub mod access;
pub mod calculations;
pub mod dashboard;
pub mod db;
pub mod input;
pub mod models;
pub mod report;
pub mod settings;

pub use access::{AccessLevel, SessionContext};
pub use db::repository::{RepositoryError, SettingsRepository};
pub use models::*;
pub use settings::{SettingsError, SettingsService};

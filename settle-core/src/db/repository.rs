use async_trait::async_trait;
use thiserror::Error;

use crate::models::{OperatorId, OperatorSettings, OperatorSettingsRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for per-operator rates.
///
/// A missing row is not an error: `get_settings` returns `Ok(None)` and the
/// caller falls back to zero rates.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(
        &self,
        operator_id: OperatorId,
    ) -> Result<Option<OperatorSettings>, RepositoryError>;

    /// Inserts or replaces the row for `operator_id`.
    async fn upsert_settings(
        &self,
        operator_id: OperatorId,
        settings: &OperatorSettings,
    ) -> Result<(), RepositoryError>;

    /// Every stored row, ordered by operator id.
    async fn list_settings(&self) -> Result<Vec<OperatorSettingsRecord>, RepositoryError>;
}

use async_trait::async_trait;
use settle_core::db::repository::{RepositoryError, SettingsRepository};
use settle_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteSettingsRepository;

/// Backend `"sqlite"`: opens the database file and applies migrations.
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SettingsRepository>, RepositoryError> {
        let repo = SqliteSettingsRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        Ok(Box::new(repo))
    }
}

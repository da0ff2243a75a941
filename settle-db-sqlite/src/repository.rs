use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use settle_core::{
    OperatorId, OperatorSettings, OperatorSettingsRecord, RepositoryError, SettingsRepository,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Opens `database_url`, creating the file when it does not exist.
    ///
    /// Accepts a bare path (`settle.db`), a sqlx URL (`sqlite://settle.db`)
    /// or `:memory:`. In-memory databases use a single connection so every
    /// query sees the same schema.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepositoryError::Configuration(e.to_string()))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        debug!(database = %database_url, "sqlite settings store opened");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_settings(row: &SqliteRow) -> Result<OperatorSettings, RepositoryError> {
    Ok(OperatorSettings {
        commission_rate: row.try_get("commission_rate").map_err(db_err)?,
        ap_rate: row.try_get("ap_rate").map_err(db_err)?,
    })
}

fn row_to_record(row: &SqliteRow) -> Result<OperatorSettingsRecord, RepositoryError> {
    let raw_id: i64 = row.try_get("operator_id").map_err(db_err)?;
    let operator_id =
        OperatorId::try_from(raw_id).map_err(|e| RepositoryError::Database(e.to_string()))?;

    Ok(OperatorSettingsRecord {
        operator_id,
        settings: row_to_settings(row)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get_settings(
        &self,
        operator_id: OperatorId,
    ) -> Result<Option<OperatorSettings>, RepositoryError> {
        let row = sqlx::query(
            "SELECT commission_rate, ap_rate
             FROM operator_settings WHERE operator_id = ?",
        )
        .bind(i64::from(operator_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_settings).transpose()
    }

    async fn upsert_settings(
        &self,
        operator_id: OperatorId,
        settings: &OperatorSettings,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO operator_settings (operator_id, commission_rate, ap_rate, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(operator_id) DO UPDATE SET
                 commission_rate = excluded.commission_rate,
                 ap_rate = excluded.ap_rate,
                 updated_at = excluded.updated_at",
        )
        .bind(i64::from(operator_id))
        .bind(settings.commission_rate)
        .bind(settings.ap_rate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<OperatorSettingsRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT operator_id, commission_rate, ap_rate, updated_at
             FROM operator_settings ORDER BY operator_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_record).collect()
    }
}

//! Per-operator rate storage behind an access-level gate.

use thiserror::Error;
use tracing::{info, warn};

use crate::access::{AccessLevel, SessionContext};
use crate::db::repository::{RepositoryError, SettingsRepository};
use crate::models::{OperatorId, OperatorSettings, OperatorSettingsRecord};

/// Minimum level allowed to change operator rates.
pub const SETTINGS_WRITE_LEVEL: AccessLevel = AccessLevel::Admin;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The message is shown to the user as is.
    #[error("この操作にはAdmin以上の権限が必要です")]
    PermissionDenied {
        required: AccessLevel,
        actual: Option<AccessLevel>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read/write access to operator settings.
///
/// Reads never fail from the caller's point of view: a missing row or a
/// broken store both yield zero rates so the calculator keeps working.
pub struct SettingsService {
    repo: Box<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Box<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Stored rates for `operator_id`, or zero rates when none are available.
    pub async fn effective_settings(
        &self,
        operator_id: OperatorId,
    ) -> OperatorSettings {
        match self.repo.get_settings(operator_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => OperatorSettings::default(),
            Err(e) => {
                warn!(operator = %operator_id, "settings unavailable, using zero rates: {}", e);
                OperatorSettings::default()
            }
        }
    }

    /// Effective settings for every slot, in slot order.
    pub async fn effective_all(&self) -> Vec<(OperatorId, OperatorSettings)> {
        let mut all = Vec::with_capacity(usize::from(OperatorId::MAX));
        for id in OperatorId::all() {
            all.push((id, self.effective_settings(id).await));
        }
        all
    }

    /// Raw lookup that surfaces repository errors.
    pub async fn get(
        &self,
        operator_id: OperatorId,
    ) -> Result<Option<OperatorSettings>, SettingsError> {
        Ok(self.repo.get_settings(operator_id).await?)
    }

    pub async fn list(&self) -> Result<Vec<OperatorSettingsRecord>, SettingsError> {
        Ok(self.repo.list_settings().await?)
    }

    /// Persists one operator's rates. Requires [`SETTINGS_WRITE_LEVEL`].
    pub async fn save(
        &self,
        ctx: &SessionContext,
        operator_id: OperatorId,
        settings: OperatorSettings,
    ) -> Result<(), SettingsError> {
        authorize(ctx)?;
        self.write(operator_id, settings).await
    }

    /// Persists several operators' rates after a single permission check.
    /// Stops at the first repository failure.
    pub async fn save_all<I>(
        &self,
        ctx: &SessionContext,
        entries: I,
    ) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = (OperatorId, OperatorSettings)> + Send,
        I::IntoIter: Send,
    {
        authorize(ctx)?;
        for (operator_id, settings) in entries {
            self.write(operator_id, settings).await?;
        }
        Ok(())
    }

    async fn write(
        &self,
        operator_id: OperatorId,
        settings: OperatorSettings,
    ) -> Result<(), SettingsError> {
        let settings = settings.clamped();
        self.repo.upsert_settings(operator_id, &settings).await?;
        info!(
            operator = %operator_id,
            commission_rate = settings.commission_rate,
            ap_rate = settings.ap_rate,
            "operator settings saved"
        );
        Ok(())
    }
}

fn authorize(ctx: &SessionContext) -> Result<(), SettingsError> {
    if ctx.has_permission(SETTINGS_WRITE_LEVEL) {
        return Ok(());
    }
    warn!(level = ?ctx.level(), "settings write denied");
    Err(SettingsError::PermissionDenied {
        required: SETTINGS_WRITE_LEVEL,
        actual: ctx.level(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tracing::subscriber::DefaultGuard;

    use super::*;

    fn init_test_tracing() -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // ========================================================================
    // in-memory repository
    // ========================================================================

    #[derive(Clone, Default)]
    struct MemoryRepository {
        rows: Arc<Mutex<BTreeMap<OperatorId, OperatorSettings>>>,
        broken: bool,
    }

    impl MemoryRepository {
        fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        fn snapshot(&self) -> BTreeMap<OperatorId, OperatorSettings> {
            self.rows.lock().unwrap().clone()
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.broken {
                Err(RepositoryError::Connection("store offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for MemoryRepository {
        async fn get_settings(
            &self,
            operator_id: OperatorId,
        ) -> Result<Option<OperatorSettings>, RepositoryError> {
            self.check()?;
            Ok(self.rows.lock().unwrap().get(&operator_id).copied())
        }

        async fn upsert_settings(
            &self,
            operator_id: OperatorId,
            settings: &OperatorSettings,
        ) -> Result<(), RepositoryError> {
            self.check()?;
            self.rows.lock().unwrap().insert(operator_id, *settings);
            Ok(())
        }

        async fn list_settings(&self) -> Result<Vec<OperatorSettingsRecord>, RepositoryError> {
            self.check()?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .map(|(id, settings)| OperatorSettingsRecord {
                    operator_id: *id,
                    settings: *settings,
                    updated_at: Utc::now(),
                })
                .collect())
        }
    }

    fn id(n: u8) -> OperatorId {
        OperatorId::new(n).unwrap()
    }

    fn service() -> (SettingsService, MemoryRepository) {
        let repo = MemoryRepository::default();
        (SettingsService::new(Box::new(repo.clone())), repo)
    }

    // ========================================================================
    // reads
    // ========================================================================

    #[tokio::test]
    async fn missing_record_yields_zero_rates() {
        let (service, _) = service();

        let result = service.effective_settings(id(3)).await;

        assert_eq!(result, OperatorSettings::default());
    }

    #[tokio::test]
    async fn broken_store_degrades_to_zero_rates() {
        let _guard = init_test_tracing();
        let service = SettingsService::new(Box::new(MemoryRepository::broken()));

        let result = service.effective_settings(id(1)).await;

        assert_eq!(result, OperatorSettings::default());
        assert_eq!(
            service.get(id(1)).await,
            Err(SettingsError::Repository(RepositoryError::Connection(
                "store offline".to_string()
            )))
        );
    }

    // ========================================================================
    // writes
    // ========================================================================

    #[tokio::test]
    async fn admin_save_is_persisted() {
        let (service, _) = service();
        let ctx = SessionContext::new(AccessLevel::Admin);

        service.save(&ctx, id(2), OperatorSettings::new(50, 30)).await.unwrap();

        assert_eq!(service.effective_settings(id(2)).await, OperatorSettings::new(50, 30));
    }

    #[tokio::test]
    async fn operator_save_is_denied_and_store_unchanged() {
        let _guard = init_test_tracing();
        let (service, repo) = service();
        let admin = SessionContext::new(AccessLevel::Admin);
        service.save(&admin, id(1), OperatorSettings::new(10, 5)).await.unwrap();
        let before = repo.snapshot();

        let result = service
            .save(&SessionContext::new(AccessLevel::Operator), id(1), OperatorSettings::new(99, 99))
            .await;

        assert_eq!(
            result,
            Err(SettingsError::PermissionDenied {
                required: AccessLevel::Admin,
                actual: Some(AccessLevel::Operator),
            })
        );
        assert_eq!(repo.snapshot(), before);
    }

    #[tokio::test]
    async fn denial_message_is_user_facing() {
        let _guard = init_test_tracing();
        let (service, _) = service();

        let err = service
            .save(&SessionContext::anonymous(), id(1), OperatorSettings::new(1, 1))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "この操作にはAdmin以上の権限が必要です");
    }

    #[tokio::test]
    async fn negative_rates_are_clamped_before_persisting() {
        let (service, repo) = service();

        service
            .save(&SessionContext::new(AccessLevel::Owner), id(4), OperatorSettings::new(-5, 7))
            .await
            .unwrap();

        assert_eq!(repo.snapshot()[&id(4)], OperatorSettings::new(0, 7));
    }

    #[tokio::test]
    async fn save_all_writes_every_slot() {
        let (service, _) = service();
        let entries = OperatorId::all().map(|op| (op, OperatorSettings::new(i64::from(op.get()), 1)));

        service
            .save_all(&SessionContext::new(AccessLevel::Admin), entries)
            .await
            .unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[4].settings, OperatorSettings::new(5, 1));
    }

    #[tokio::test]
    async fn save_all_is_denied_before_any_write() {
        let _guard = init_test_tracing();
        let (service, repo) = service();

        let result = service
            .save_all(
                &SessionContext::new(AccessLevel::Viewer),
                vec![(id(1), OperatorSettings::new(1, 1))],
            )
            .await;

        assert!(matches!(result, Err(SettingsError::PermissionDenied { .. })));
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn effective_all_covers_every_slot() {
        let (service, _) = service();
        service
            .save(&SessionContext::new(AccessLevel::Admin), id(5), OperatorSettings::new(3, 2))
            .await
            .unwrap();

        let all = service.effective_all().await;

        assert_eq!(all.len(), 5);
        assert_eq!(all[0], (id(1), OperatorSettings::default()));
        assert_eq!(all[4], (id(5), OperatorSettings::new(3, 2)));
    }
}

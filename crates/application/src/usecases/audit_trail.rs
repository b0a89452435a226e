use std::{sync::Arc, time::Duration};

use domain::{
    repositories::audit_logs::AuditLogRepository, value_objects::audit_logs::AuditEntryModel,
};
use tracing::{error, info};

use crate::{
    store_call::{StoreCallError, store_call},
    usecases::payment_review::clamp_limit,
};

pub struct AuditTrailUseCase {
    repository: Arc<dyn AuditLogRepository + Send + Sync>,
    store_timeout: Duration,
}

impl AuditTrailUseCase {
    pub fn new(
        repository: Arc<dyn AuditLogRepository + Send + Sync>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            store_timeout,
        }
    }

    /// Newest first. `limit` defaults to 50 and is clamped to 1..=200.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<AuditEntryModel>, StoreCallError> {
        let limit = clamp_limit(limit);
        let entries = store_call(
            self.store_timeout,
            "audit_logs.list_recent",
            self.repository.list_recent(limit),
        )
        .await
        .map_err(|err| {
            error!(limit, db_error = ?err, "audit_trail: failed to list audit entries");
            err
        })?;

        info!(limit, count = entries.len(), "audit_trail: audit entries listed");
        Ok(entries.into_iter().map(AuditEntryModel::from).collect())
    }
}

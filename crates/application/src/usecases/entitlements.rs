use std::{sync::Arc, time::Duration};

use chrono::Utc;
use domain::{
    repositories::entitlements::EntitlementRepository,
    value_objects::{entitlements::EntitlementView, enums::plan_tiers::PlanTier},
};
use http::StatusCode;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::store_call::{StoreCallError, store_call};

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("{required} plan required")]
    InsufficientTier { required: PlanTier },
    #[error("store call {0} timed out")]
    Timeout(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntitlementError::InsufficientTier { .. } => StatusCode::FORBIDDEN,
            EntitlementError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            EntitlementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreCallError> for EntitlementError {
    fn from(err: StoreCallError) -> Self {
        match err {
            StoreCallError::Timeout { label, .. } => EntitlementError::Timeout(label),
            StoreCallError::Failed(err) => EntitlementError::Internal(err),
        }
    }
}

/// Read side of entitlements. Expiry is applied here, at read time; stored
/// rows are never downgraded.
pub struct EntitlementUseCase {
    repository: Arc<dyn EntitlementRepository + Send + Sync>,
    store_timeout: Duration,
}

impl EntitlementUseCase {
    pub fn new(
        repository: Arc<dyn EntitlementRepository + Send + Sync>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            store_timeout,
        }
    }

    pub async fn current(&self, user_id: Uuid) -> Result<EntitlementView, EntitlementError> {
        let entitlement = store_call(
            self.store_timeout,
            "entitlements.get_entitlement",
            self.repository.get_entitlement(user_id),
        )
        .await
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "entitlements: failed to load entitlement");
            EntitlementError::from(err)
        })?;

        let view = match entitlement {
            Some(entity) => EntitlementView::from_entity(&entity, Utc::now()),
            None => EntitlementView::free(user_id),
        };
        debug!(
            %user_id,
            stored_tier = %view.plan_tier,
            effective_tier = %view.effective_tier,
            "entitlements: entitlement resolved"
        );
        Ok(view)
    }

    /// Gate for tier-restricted features.
    pub async fn require_tier(
        &self,
        user_id: Uuid,
        required: PlanTier,
    ) -> Result<EntitlementView, EntitlementError> {
        let view = self.current(user_id).await?;
        if view.effective_tier < required {
            return Err(EntitlementError::InsufficientTier { required });
        }
        Ok(view)
    }
}

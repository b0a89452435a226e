use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::entitlements::EntitlementEntity;

#[automock]
#[async_trait]
pub trait EntitlementRepository {
    async fn get_entitlement(&self, user_id: Uuid) -> Result<Option<EntitlementEntity>>;
}

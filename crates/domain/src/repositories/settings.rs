use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::value_objects::plans::PlanCatalogEntry;

/// Centrally managed configuration, read per request.
#[automock]
#[async_trait]
pub trait SettingsRepository {
    async fn get_configured_secret(&self, key: &str) -> Result<Option<String>>;

    async fn list_plan_catalog(&self) -> Result<Vec<PlanCatalogEntry>>;
}

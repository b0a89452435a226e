use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::entities::audit_logs::AuditLogEntity;

/// Audit rows are written inside the transactions of the mutations they
/// describe; this trait only reads them back.
#[automock]
#[async_trait]
pub trait AuditLogRepository {
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLogEntity>>;
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use domain::{
    entities::audit_logs::{AuditLogEntity, InsertAuditLogEntity},
    repositories::audit_logs::AuditLogRepository,
    schema::admin_audit_logs,
};

use crate::postgres::postgres_connection::{PgPoolSquad, with_connection};

pub struct AuditLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AuditLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AuditLogRepository for AuditLogPostgres {
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLogEntity>> {
        with_connection(&self.db_pool, move |conn| {
            let entries = admin_audit_logs::table
                .order(admin_audit_logs::created_at.desc())
                .limit(limit)
                .select(AuditLogEntity::as_select())
                .load(conn)?;
            Ok(entries)
        })
        .await
    }
}

/// Audit rows are only ever written through this, inside the caller's transaction.
pub(crate) fn append_audit_entry(
    conn: &mut PgConnection,
    entry: &InsertAuditLogEntity,
) -> QueryResult<usize> {
    insert_into(admin_audit_logs::table)
        .values(entry)
        .execute(conn)
}

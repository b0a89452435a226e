use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::admin_audit_logs;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = admin_audit_logs)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = admin_audit_logs)]
pub struct InsertAuditLogEntity {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

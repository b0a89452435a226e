use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::audit_logs::{AuditLogEntity, InsertAuditLogEntity},
    value_objects::{enums::audit_actions::AuditAction, payment_requests::SYSTEM_ACTOR},
};

pub const PAYMENT_REQUESTS_TABLE: &str = "payment_requests";
pub const ENTITLEMENTS_TABLE: &str = "entitlements";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditActor {
    System,
    Admin(Uuid),
    User(Uuid),
}

impl AuditActor {
    pub fn actor_id(&self) -> String {
        match self {
            AuditActor::System => SYSTEM_ACTOR.to_string(),
            AuditActor::Admin(id) | AuditActor::User(id) => id.to_string(),
        }
    }
}

/// Builder input for one append-only audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor: AuditActor,
    pub action: AuditAction,
    pub entity_table: &'static str,
    pub entity_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn into_entity(self) -> InsertAuditLogEntity {
        InsertAuditLogEntity {
            id: Uuid::new_v4(),
            actor_id: self.actor.actor_id(),
            action: self.action.to_string(),
            entity_table: self.entity_table.to_string(),
            entity_id: self.entity_id,
            target_user_id: self.target_user_id,
            details: self.details,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntryModel {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntity> for AuditEntryModel {
    fn from(value: AuditLogEntity) -> Self {
        Self {
            id: value.id,
            actor_id: value.actor_id,
            action: value.action,
            entity_table: value.entity_table,
            entity_id: value.entity_id,
            target_user_id: value.target_user_id,
            details: value.details,
            created_at: value.created_at,
        }
    }
}

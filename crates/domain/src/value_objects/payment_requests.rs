use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{
        audit_logs::InsertAuditLogEntity,
        financial_transactions::InsertFinancialTransactionEntity,
        payment_requests::{InsertPaymentRequestEntity, PaymentRequestEntity, PaymentRequestWithUser},
    },
    value_objects::enums::{
        payment_request_statuses::PaymentRequestStatus, plan_tiers::PlanTier,
    },
};

/// Actor recorded for automated decisions.
pub const SYSTEM_ACTOR: &str = "system";

/// Everything a settled external sale writes, applied as one transaction.
/// The ledger row goes first; a conflict on it means the sale was already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSettlement {
    pub user_id: Uuid,
    pub tier: PlanTier,
    pub validity_days: i64,
    pub settled_at: DateTime<Utc>,
    pub ledger_entry: InsertFinancialTransactionEntity,
    pub payment_request: InsertPaymentRequestEntity,
    pub audit_entry: InsertAuditLogEntity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionActivation {
    pub user_id: Uuid,
    pub period_days: i64,
    pub activated_at: DateTime<Utc>,
    pub ledger_entry: InsertFinancialTransactionEntity,
    pub audit_entry: InsertAuditLogEntity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    Applied(AppliedSettlement),
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSettlement {
    pub payment_request_id: Option<Uuid>,
    pub plan_tier: PlanTier,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub promotion_expires_at: Option<DateTime<Utc>>,
}

/// Conditional approval: only applies while the request is still pending.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalCommand {
    pub payment_request_id: Uuid,
    pub processed_by: String,
    pub validity_days: i64,
    pub reviewed_evidence_reference: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub audit_entry: InsertAuditLogEntity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectionCommand {
    pub payment_request_id: Uuid,
    pub processed_by: String,
    pub reason: String,
    pub reviewed_evidence_reference: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub audit_entry: InsertAuditLogEntity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceAttachment {
    pub payment_request_id: Uuid,
    pub reviewed_evidence_reference: String,
    pub audit_entry: InsertAuditLogEntity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewTransition {
    Applied(PaymentRequestEntity),
    NotFound,
    AlreadyProcessed(PaymentRequestStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequestModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_full_name: Option<String>,
    pub provider: String,
    pub desired_plan_tier: PlanTier,
    pub status: PaymentRequestStatus,
    pub amount_minor: Option<i64>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub evidence_reference: Option<String>,
    pub reviewed_evidence_reference: Option<String>,
    pub rejection_reason: Option<String>,
    pub external_transaction_id: Option<String>,
}

impl From<PaymentRequestEntity> for PaymentRequestModel {
    fn from(value: PaymentRequestEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            user_email: None,
            user_full_name: None,
            desired_plan_tier: value.desired_tier(),
            status: value.status(),
            provider: value.provider,
            amount_minor: value.amount_minor,
            requested_at: value.requested_at,
            processed_at: value.processed_at,
            processed_by: value.processed_by,
            evidence_reference: value.evidence_reference,
            reviewed_evidence_reference: value.reviewed_evidence_reference,
            rejection_reason: value.rejection_reason,
            external_transaction_id: value.external_transaction_id,
        }
    }
}

impl From<PaymentRequestWithUser> for PaymentRequestModel {
    fn from(value: PaymentRequestWithUser) -> Self {
        Self {
            user_email: value.email,
            user_full_name: value.full_name,
            ..Self::from(value.request)
        }
    }
}

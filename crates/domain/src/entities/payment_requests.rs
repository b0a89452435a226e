use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    schema::payment_requests,
    value_objects::enums::{
        payment_request_statuses::PaymentRequestStatus, plan_tiers::PlanTier,
    },
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_requests)]
pub struct PaymentRequestEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub desired_plan_tier: String,
    pub status: String,
    pub amount_minor: Option<i64>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub evidence_reference: Option<String>,
    pub reviewed_evidence_reference: Option<String>,
    pub rejection_reason: Option<String>,
    pub external_transaction_id: Option<String>,
}

impl PaymentRequestEntity {
    /// Unknown stored statuses are treated as already processed so they can never be decided twice.
    pub fn status(&self) -> PaymentRequestStatus {
        PaymentRequestStatus::from_str(&self.status).unwrap_or(PaymentRequestStatus::Rejected)
    }

    pub fn desired_tier(&self) -> PlanTier {
        PlanTier::from_str(&self.desired_plan_tier).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_requests)]
pub struct InsertPaymentRequestEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub desired_plan_tier: String,
    pub status: String,
    pub amount_minor: Option<i64>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub evidence_reference: Option<String>,
    pub external_transaction_id: Option<String>,
}

/// Decision columns written by approve/reject. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = payment_requests)]
pub struct PaymentDecisionChangeset {
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub reviewed_evidence_reference: Option<String>,
}

/// A payment request joined with the requesting user's display info.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequestWithUser {
    pub request: PaymentRequestEntity,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

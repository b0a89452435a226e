use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::{
    entities::{
        audit_logs::InsertAuditLogEntity,
        payment_requests::{
            InsertPaymentRequestEntity, PaymentRequestEntity, PaymentRequestWithUser,
        },
    },
    value_objects::{
        enums::payment_request_statuses::PaymentRequestStatus,
        payment_requests::{
            ApprovalCommand, EvidenceAttachment, RejectionCommand, ReviewTransition,
        },
    },
};

#[automock]
#[async_trait]
pub trait PaymentReviewRepository {
    async fn find_by_id(&self, payment_request_id: Uuid) -> Result<Option<PaymentRequestEntity>>;

    /// Newest first. `None` lists every status.
    async fn list_by_status(
        &self,
        status: Option<PaymentRequestStatus>,
        limit: i64,
    ) -> Result<Vec<PaymentRequestWithUser>>;

    async fn insert_pending(
        &self,
        request: InsertPaymentRequestEntity,
        audit_entry: InsertAuditLogEntity,
    ) -> Result<Uuid>;

    /// Pending → approved, entitlement renewal and audit entry in one transaction.
    async fn approve_pending(&self, approval: ApprovalCommand) -> Result<ReviewTransition>;

    /// Pending → rejected and audit entry in one transaction. Entitlement untouched.
    async fn reject_pending(&self, rejection: RejectionCommand) -> Result<ReviewTransition>;

    async fn attach_reviewed_evidence(
        &self,
        attachment: EvidenceAttachment,
    ) -> Result<ReviewTransition>;
}

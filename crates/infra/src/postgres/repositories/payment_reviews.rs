use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use domain::{
    entities::{
        audit_logs::InsertAuditLogEntity,
        payment_requests::{
            InsertPaymentRequestEntity, PaymentDecisionChangeset, PaymentRequestEntity,
            PaymentRequestWithUser,
        },
    },
    repositories::payment_reviews::PaymentReviewRepository,
    schema::{entitlements, payment_requests, profiles},
    value_objects::{
        entitlements::renew,
        enums::payment_request_statuses::PaymentRequestStatus,
        payment_requests::{
            ApprovalCommand, EvidenceAttachment, RejectionCommand, ReviewTransition,
        },
    },
};
use uuid::Uuid;

use crate::postgres::{
    postgres_connection::{PgPoolSquad, with_connection},
    repositories::{audit_logs::append_audit_entry, entitlements::lock_entitlement},
};

pub struct PaymentReviewPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentReviewPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentReviewRepository for PaymentReviewPostgres {
    async fn find_by_id(&self, payment_request_id: Uuid) -> Result<Option<PaymentRequestEntity>> {
        with_connection(&self.db_pool, move |conn| {
            let request = payment_requests::table
                .find(payment_request_id)
                .select(PaymentRequestEntity::as_select())
                .first(conn)
                .optional()?;
            Ok(request)
        })
        .await
    }

    async fn list_by_status(
        &self,
        status: Option<PaymentRequestStatus>,
        limit: i64,
    ) -> Result<Vec<PaymentRequestWithUser>> {
        with_connection(&self.db_pool, move |conn| {
            let mut query = payment_requests::table
                .left_join(profiles::table)
                .select((
                    PaymentRequestEntity::as_select(),
                    profiles::email.nullable(),
                    profiles::full_name.nullable(),
                ))
                .into_boxed();

            if let Some(status) = status {
                query = query.filter(payment_requests::status.eq(status.to_string()));
            }

            let rows = query
                .order(payment_requests::requested_at.desc())
                .limit(limit)
                .load::<(PaymentRequestEntity, Option<String>, Option<String>)>(conn)?;

            Ok(rows
                .into_iter()
                .map(|(request, email, full_name)| PaymentRequestWithUser {
                    request,
                    email,
                    full_name,
                })
                .collect())
        })
        .await
    }

    async fn insert_pending(
        &self,
        request: InsertPaymentRequestEntity,
        audit_entry: InsertAuditLogEntity,
    ) -> Result<Uuid> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                let id = insert_into(payment_requests::table)
                    .values(&request)
                    .returning(payment_requests::id)
                    .get_result::<Uuid>(tx)?;
                append_audit_entry(tx, &audit_entry)?;
                Ok(id)
            })
        })
        .await
    }

    async fn approve_pending(&self, approval: ApprovalCommand) -> Result<ReviewTransition> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                let decision = PaymentDecisionChangeset {
                    status: PaymentRequestStatus::Approved.to_string(),
                    processed_at: Some(approval.processed_at),
                    processed_by: Some(approval.processed_by.clone()),
                    rejection_reason: None,
                    reviewed_evidence_reference: approval.reviewed_evidence_reference.clone(),
                };
                let Some(request) = decide_pending(tx, approval.payment_request_id, &decision)?
                else {
                    return Ok(missing_transition(tx, approval.payment_request_id)?);
                };

                let current = lock_entitlement(tx, request.user_id, approval.processed_at)?;
                let renewal = renew(
                    Some(&current),
                    request.desired_tier(),
                    approval.validity_days,
                    approval.processed_at,
                );

                update(entitlements::table.find(request.user_id))
                    .set((
                        entitlements::plan_tier.eq(renewal.tier.to_string()),
                        entitlements::plan_expires_at.eq(renewal.expires_at),
                        entitlements::updated_at.eq(approval.processed_at),
                    ))
                    .execute(tx)?;

                append_audit_entry(tx, &approval.audit_entry)?;

                Ok(ReviewTransition::Applied(request))
            })
        })
        .await
    }

    async fn reject_pending(&self, rejection: RejectionCommand) -> Result<ReviewTransition> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                let decision = PaymentDecisionChangeset {
                    status: PaymentRequestStatus::Rejected.to_string(),
                    processed_at: Some(rejection.processed_at),
                    processed_by: Some(rejection.processed_by.clone()),
                    rejection_reason: Some(rejection.reason.clone()),
                    reviewed_evidence_reference: rejection.reviewed_evidence_reference.clone(),
                };
                let Some(request) = decide_pending(tx, rejection.payment_request_id, &decision)?
                else {
                    return Ok(missing_transition(tx, rejection.payment_request_id)?);
                };

                append_audit_entry(tx, &rejection.audit_entry)?;

                Ok(ReviewTransition::Applied(request))
            })
        })
        .await
    }

    async fn attach_reviewed_evidence(
        &self,
        attachment: EvidenceAttachment,
    ) -> Result<ReviewTransition> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                let updated = update(payment_requests::table)
                    .filter(payment_requests::id.eq(attachment.payment_request_id))
                    .set(
                        payment_requests::reviewed_evidence_reference
                            .eq(&attachment.reviewed_evidence_reference),
                    )
                    .returning(PaymentRequestEntity::as_returning())
                    .get_result(tx)
                    .optional()?;

                let Some(request) = updated else {
                    return Ok(ReviewTransition::NotFound);
                };

                append_audit_entry(tx, &attachment.audit_entry)?;

                Ok(ReviewTransition::Applied(request))
            })
        })
        .await
    }
}

/// Conditional update: only a row still in `pending` is decided.
fn decide_pending(
    conn: &mut PgConnection,
    payment_request_id: Uuid,
    decision: &PaymentDecisionChangeset,
) -> QueryResult<Option<PaymentRequestEntity>> {
    update(payment_requests::table)
        .filter(payment_requests::id.eq(payment_request_id))
        .filter(payment_requests::status.eq(PaymentRequestStatus::Pending.to_string()))
        .set(decision)
        .returning(PaymentRequestEntity::as_returning())
        .get_result(conn)
        .optional()
}

fn missing_transition(
    conn: &mut PgConnection,
    payment_request_id: Uuid,
) -> QueryResult<ReviewTransition> {
    let status = payment_requests::table
        .find(payment_request_id)
        .select(payment_requests::status)
        .first::<String>(conn)
        .optional()?;

    Ok(match status {
        None => ReviewTransition::NotFound,
        Some(status) => ReviewTransition::AlreadyProcessed(
            PaymentRequestStatus::from_str(&status).unwrap_or(PaymentRequestStatus::Rejected),
        ),
    })
}

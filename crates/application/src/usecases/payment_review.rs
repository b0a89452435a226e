use std::{sync::Arc, time::Duration};

use chrono::Utc;
use domain::{
    entities::payment_requests::{InsertPaymentRequestEntity, PaymentRequestEntity},
    repositories::payment_reviews::PaymentReviewRepository,
    value_objects::{
        audit_logs::{AuditActor, NewAuditEntry, PAYMENT_REQUESTS_TABLE},
        enums::{
            audit_actions::AuditAction, payment_providers::PaymentProvider,
            payment_request_statuses::PaymentRequestStatus, plan_tiers::PlanTier,
        },
        payment_requests::{
            ApprovalCommand, EvidenceAttachment, PaymentRequestModel, RejectionCommand,
            ReviewTransition,
        },
    },
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    store_call::{StoreCallError, store_call},
    usecases::plan_resolver::PlanResolver,
};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("payment request not found")]
    NotFound,
    #[error("payment request already {0}")]
    AlreadyProcessed(PaymentRequestStatus),
    #[error("a rejection reason is required")]
    EmptyReason,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store call {0} timed out")]
    Timeout(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReviewError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::NotFound => StatusCode::NOT_FOUND,
            ReviewError::AlreadyProcessed(_) => StatusCode::CONFLICT,
            ReviewError::EmptyReason => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ReviewError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReviewError::Timeout(_) | ReviewError::Internal(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            ReviewError::NotFound => "not_found",
            ReviewError::AlreadyProcessed(_) => "already_processed",
            ReviewError::EmptyReason => "empty_reason",
            ReviewError::InvalidInput(_) => "invalid_input",
            ReviewError::Timeout(_) => "timeout",
            ReviewError::Internal(_) => "internal",
        }
    }
}

impl From<StoreCallError> for ReviewError {
    fn from(err: StoreCallError) -> Self {
        match err {
            StoreCallError::Timeout { label, .. } => ReviewError::Timeout(label),
            StoreCallError::Failed(err) => ReviewError::Internal(err),
        }
    }
}

pub type ReviewResult<T> = std::result::Result<T, ReviewError>;

/// Manual payment requests: user submission and admin decisions.
pub struct PaymentReviewUseCase {
    repository: Arc<dyn PaymentReviewRepository + Send + Sync>,
    plan_resolver: PlanResolver,
    store_timeout: Duration,
}

impl PaymentReviewUseCase {
    pub fn new(
        repository: Arc<dyn PaymentReviewRepository + Send + Sync>,
        plan_resolver: PlanResolver,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            plan_resolver,
            store_timeout,
        }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        desired_tier: PlanTier,
        evidence_reference: Option<String>,
    ) -> ReviewResult<Uuid> {
        if !desired_tier.is_paid() {
            return Err(ReviewError::InvalidInput(
                "desired plan tier must be a paid tier".to_string(),
            ));
        }

        let now = Utc::now();
        let evidence_reference = non_blank(evidence_reference);
        let request = InsertPaymentRequestEntity {
            id: Uuid::new_v4(),
            user_id,
            provider: PaymentProvider::Manual.to_string(),
            desired_plan_tier: desired_tier.to_string(),
            status: PaymentRequestStatus::Pending.to_string(),
            amount_minor: None,
            requested_at: now,
            processed_at: None,
            processed_by: None,
            evidence_reference: evidence_reference.clone(),
            external_transaction_id: None,
        };
        let audit_entry = NewAuditEntry {
            actor: AuditActor::User(user_id),
            action: AuditAction::PaymentRequested,
            entity_table: PAYMENT_REQUESTS_TABLE,
            entity_id: request.id,
            target_user_id: Some(user_id),
            details: json!({
                "desired_plan_tier": desired_tier,
                "evidence_reference": evidence_reference,
            }),
            created_at: now,
        }
        .into_entity();

        let id = store_call(
            self.store_timeout,
            "payment_reviews.insert_pending",
            self.repository.insert_pending(request, audit_entry),
        )
        .await
        .map_err(|err| {
            error!(%user_id, db_error = ?err, "payment_review: failed to submit payment request");
            ReviewError::from(err)
        })?;

        info!(%user_id, payment_request_id = %id, tier = %desired_tier, "payment_review: payment request submitted");
        Ok(id)
    }

    pub async fn list(
        &self,
        status: Option<PaymentRequestStatus>,
        limit: Option<i64>,
    ) -> ReviewResult<Vec<PaymentRequestModel>> {
        let limit = clamp_limit(limit);
        let rows = store_call(
            self.store_timeout,
            "payment_reviews.list_by_status",
            self.repository.list_by_status(status, limit),
        )
        .await
        .map_err(|err| {
            error!(?status, db_error = ?err, "payment_review: failed to list payment requests");
            ReviewError::from(err)
        })?;

        info!(?status, count = rows.len(), "payment_review: payment requests listed");
        Ok(rows.into_iter().map(PaymentRequestModel::from).collect())
    }

    pub async fn approve(
        &self,
        admin_id: Uuid,
        payment_request_id: Uuid,
        reviewed_evidence_reference: Option<String>,
    ) -> ReviewResult<PaymentRequestModel> {
        let request = self.load_pending(payment_request_id).await?;
        let tier = request.desired_tier();
        let plan = self.plan_resolver.resolve_tier(tier).await?;
        let reviewed_evidence_reference = non_blank(reviewed_evidence_reference);
        let now = Utc::now();

        let approval = ApprovalCommand {
            payment_request_id,
            processed_by: admin_id.to_string(),
            validity_days: plan.validity_days,
            reviewed_evidence_reference: reviewed_evidence_reference.clone(),
            processed_at: now,
            audit_entry: NewAuditEntry {
                actor: AuditActor::Admin(admin_id),
                action: AuditAction::PaymentApproved,
                entity_table: PAYMENT_REQUESTS_TABLE,
                entity_id: payment_request_id,
                target_user_id: Some(request.user_id),
                details: json!({
                    "provider": request.provider,
                    "plan_tier": tier,
                    "validity_days": plan.validity_days,
                    "reviewed_evidence_reference": reviewed_evidence_reference,
                }),
                created_at: now,
            }
            .into_entity(),
        };

        let transition = store_call(
            self.store_timeout,
            "payment_reviews.approve_pending",
            self.repository.approve_pending(approval),
        )
        .await
        .map_err(|err| {
            error!(%payment_request_id, db_error = ?err, "payment_review: approval failed");
            ReviewError::from(err)
        })?;

        let approved = applied_or_error(payment_request_id, transition)?;
        info!(
            %admin_id,
            %payment_request_id,
            user_id = %approved.user_id,
            %tier,
            validity_days = plan.validity_days,
            "payment_review: payment request approved"
        );
        Ok(approved.into())
    }

    pub async fn reject(
        &self,
        admin_id: Uuid,
        payment_request_id: Uuid,
        reason: &str,
        reviewed_evidence_reference: Option<String>,
    ) -> ReviewResult<PaymentRequestModel> {
        let reason = reason.trim();
        if reason.is_empty() {
            warn!(%payment_request_id, "payment_review: rejection without a reason refused");
            return Err(ReviewError::EmptyReason);
        }

        let request = self.load_pending(payment_request_id).await?;
        let reviewed_evidence_reference = non_blank(reviewed_evidence_reference);
        let now = Utc::now();

        let rejection = RejectionCommand {
            payment_request_id,
            processed_by: admin_id.to_string(),
            reason: reason.to_string(),
            reviewed_evidence_reference: reviewed_evidence_reference.clone(),
            processed_at: now,
            audit_entry: NewAuditEntry {
                actor: AuditActor::Admin(admin_id),
                action: AuditAction::PaymentRejected,
                entity_table: PAYMENT_REQUESTS_TABLE,
                entity_id: payment_request_id,
                target_user_id: Some(request.user_id),
                details: json!({
                    "reason": reason,
                    "reviewed_evidence_reference": reviewed_evidence_reference,
                }),
                created_at: now,
            }
            .into_entity(),
        };

        let transition = store_call(
            self.store_timeout,
            "payment_reviews.reject_pending",
            self.repository.reject_pending(rejection),
        )
        .await
        .map_err(|err| {
            error!(%payment_request_id, db_error = ?err, "payment_review: rejection failed");
            ReviewError::from(err)
        })?;

        let rejected = applied_or_error(payment_request_id, transition)?;
        info!(%admin_id, %payment_request_id, "payment_review: payment request rejected");
        Ok(rejected.into())
    }

    /// Records the evidence an admin looked at, on a request of any status.
    pub async fn attach_reviewed_evidence(
        &self,
        admin_id: Uuid,
        payment_request_id: Uuid,
        reviewed_evidence_reference: &str,
    ) -> ReviewResult<PaymentRequestModel> {
        let reference = reviewed_evidence_reference.trim();
        if reference.is_empty() {
            return Err(ReviewError::InvalidInput(
                "reviewed evidence reference must not be empty".to_string(),
            ));
        }

        let request = self.find(payment_request_id).await?;
        let attachment = EvidenceAttachment {
            payment_request_id,
            reviewed_evidence_reference: reference.to_string(),
            audit_entry: NewAuditEntry {
                actor: AuditActor::Admin(admin_id),
                action: AuditAction::ReviewedEvidenceAttached,
                entity_table: PAYMENT_REQUESTS_TABLE,
                entity_id: payment_request_id,
                target_user_id: Some(request.user_id),
                details: json!({
                    "reviewed_evidence_reference": reference,
                    "status": request.status(),
                }),
                created_at: Utc::now(),
            }
            .into_entity(),
        };

        let transition = store_call(
            self.store_timeout,
            "payment_reviews.attach_reviewed_evidence",
            self.repository.attach_reviewed_evidence(attachment),
        )
        .await
        .map_err(|err| {
            error!(%payment_request_id, db_error = ?err, "payment_review: evidence attachment failed");
            ReviewError::from(err)
        })?;

        let updated = applied_or_error(payment_request_id, transition)?;
        info!(%admin_id, %payment_request_id, "payment_review: reviewed evidence attached");
        Ok(updated.into())
    }

    async fn find(&self, payment_request_id: Uuid) -> ReviewResult<PaymentRequestEntity> {
        store_call(
            self.store_timeout,
            "payment_reviews.find_by_id",
            self.repository.find_by_id(payment_request_id),
        )
        .await
        .map_err(|err| {
            error!(%payment_request_id, db_error = ?err, "payment_review: failed to load payment request");
            ReviewError::from(err)
        })?
        .ok_or(ReviewError::NotFound)
    }

    // Fast path only. Races are decided by the conditional update in the repository.
    async fn load_pending(&self, payment_request_id: Uuid) -> ReviewResult<PaymentRequestEntity> {
        let request = self.find(payment_request_id).await?;
        let status = request.status();
        if status.is_terminal() {
            warn!(%payment_request_id, %status, "payment_review: payment request already processed");
            return Err(ReviewError::AlreadyProcessed(status));
        }
        Ok(request)
    }
}

fn applied_or_error(
    payment_request_id: Uuid,
    transition: ReviewTransition,
) -> ReviewResult<PaymentRequestEntity> {
    match transition {
        ReviewTransition::Applied(entity) => Ok(entity),
        ReviewTransition::NotFound => Err(ReviewError::NotFound),
        ReviewTransition::AlreadyProcessed(status) => {
            warn!(%payment_request_id, %status, "payment_review: lost the race to another reviewer");
            Err(ReviewError::AlreadyProcessed(status))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

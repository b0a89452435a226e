use std::sync::Arc;

use application::usecases::{audit_trail::AuditTrailUseCase, payment_review::PaymentReviewUseCase};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRef, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use domain::value_objects::enums::payment_request_statuses::PaymentRequestStatus;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AdminUser, AuthConfig},
    axum_http::error_responses::AppError,
};

#[derive(Clone)]
pub struct AdminPaymentsState {
    pub auth: Arc<AuthConfig>,
    pub reviews: Arc<PaymentReviewUseCase>,
    pub audit_trail: Arc<AuditTrailUseCase>,
}

impl FromRef<AdminPaymentsState> for Arc<AuthConfig> {
    fn from_ref(state: &AdminPaymentsState) -> Self {
        Arc::clone(&state.auth)
    }
}

pub fn routes(state: AdminPaymentsState) -> Router {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/:id/approve", post(approve_payment))
        .route("/payments/:id/reject", post(reject_payment))
        .route("/payments/:id/evidence", post(attach_evidence))
        .route("/audit-logs", get(list_audit_logs))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// `pending` (default), `approved`, `rejected` or `all`.
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApprovePaymentRequest {
    pub reviewed_evidence_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectPaymentRequest {
    #[serde(default)]
    pub reason: String,
    pub reviewed_evidence_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachEvidenceRequest {
    pub reviewed_evidence_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

pub async fn list_payments(
    State(state): State<AdminPaymentsState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_status_filter(query.status.as_deref())?;
    info!(admin_id = %admin.user_id, ?status, "admin_payments: listing payment requests");
    let payments = state.reviews.list(status, query.limit).await?;
    Ok(Json(payments))
}

pub async fn approve_payment(
    State(state): State<AdminPaymentsState>,
    AdminUser(admin): AdminUser,
    Path(payment_request_id): Path<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let body = parse_approve_body(&body)?;
    let approved = state
        .reviews
        .approve(
            admin.user_id,
            payment_request_id,
            body.reviewed_evidence_reference,
        )
        .await?;
    Ok(Json(approved))
}

pub async fn reject_payment(
    State(state): State<AdminPaymentsState>,
    AdminUser(admin): AdminUser,
    Path(payment_request_id): Path<Uuid>,
    Json(body): Json<RejectPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rejected = state
        .reviews
        .reject(
            admin.user_id,
            payment_request_id,
            &body.reason,
            body.reviewed_evidence_reference,
        )
        .await?;
    Ok(Json(rejected))
}

pub async fn attach_evidence(
    State(state): State<AdminPaymentsState>,
    AdminUser(admin): AdminUser,
    Path(payment_request_id): Path<Uuid>,
    Json(body): Json<AttachEvidenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .reviews
        .attach_reviewed_evidence(
            admin.user_id,
            payment_request_id,
            &body.reviewed_evidence_reference,
        )
        .await?;
    Ok(Json(updated))
}

pub async fn list_audit_logs(
    State(state): State<AdminPaymentsState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    info!(admin_id = %admin.user_id, "admin_payments: listing audit trail");
    let entries = state.audit_trail.list(query.limit).await?;
    Ok(Json(entries))
}

/// The approve body is optional; an empty one means no reviewed evidence.
fn parse_approve_body(raw: &[u8]) -> Result<ApprovePaymentRequest, AppError> {
    if raw.trim_ascii().is_empty() {
        return Ok(ApprovePaymentRequest::default());
    }
    serde_json::from_slice(raw)
        .map_err(|err| AppError::BadRequest(format!("invalid approve body: {err}")))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<PaymentRequestStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Some(PaymentRequestStatus::Pending)),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => PaymentRequestStatus::from_str(raw)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("unknown status filter: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use application::usecases::plan_resolver::PlanResolver;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use domain::{
        entities::payment_requests::PaymentRequestEntity,
        repositories::{
            audit_logs::MockAuditLogRepository, payment_reviews::MockPaymentReviewRepository,
            settings::MockSettingsRepository,
        },
        value_objects::{enums::plan_tiers::PlanTier, payment_requests::ReviewTransition},
    };
    use mockall::predicate::eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{auth::issue_test_token, axum_http::error_responses::ErrorResponse};

    const SECRET: &str = "admin-router-test-secret";

    fn app(reviews: MockPaymentReviewRepository, settings: MockSettingsRepository) -> Router {
        let timeout = Duration::from_secs(1);
        routes(AdminPaymentsState {
            auth: Arc::new(AuthConfig {
                jwt_secret: SECRET.to_string(),
                admin_roles: vec!["admin".to_string()],
            }),
            reviews: Arc::new(PaymentReviewUseCase::new(
                Arc::new(reviews),
                PlanResolver::new(Arc::new(settings), 30, timeout),
                timeout,
            )),
            audit_trail: Arc::new(AuditTrailUseCase::new(
                Arc::new(MockAuditLogRepository::new()),
                timeout,
            )),
        })
    }

    fn pending(id: Uuid) -> PaymentRequestEntity {
        PaymentRequestEntity {
            id,
            user_id: Uuid::new_v4(),
            provider: "manual".to_string(),
            desired_plan_tier: PlanTier::Advance.to_string(),
            status: PaymentRequestStatus::Pending.to_string(),
            amount_minor: None,
            requested_at: Utc::now(),
            processed_at: None,
            processed_by: None,
            evidence_reference: None,
            reviewed_evidence_reference: None,
            rejection_reason: None,
            external_transaction_id: None,
        }
    }

    fn post(uri: String, role: Option<&str>, body: Value) -> Request<Body> {
        let token = issue_test_token(SECRET, Uuid::new_v4(), role);
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_rejection_reason_is_422_without_writes() {
        let app = app(
            MockPaymentReviewRepository::new(),
            MockSettingsRepository::new(),
        );

        let response = app
            .oneshot(post(
                format!("/payments/{}/reject", Uuid::new_v4()),
                Some("admin"),
                json!({ "reason": "  " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = error_body(response).await;
        assert_eq!(body.code, "empty_reason");
        assert!(!body.retryable);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let app = app(
            MockPaymentReviewRepository::new(),
            MockSettingsRepository::new(),
        );

        let response = app
            .oneshot(post(
                format!("/payments/{}/approve", Uuid::new_v4()),
                None,
                json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn approving_a_decided_request_is_409() {
        let id = Uuid::new_v4();
        let mut decided = pending(id);
        decided.status = PaymentRequestStatus::Rejected.to_string();

        let mut reviews = MockPaymentReviewRepository::new();
        reviews
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(decided.clone())));

        let response = app(reviews, MockSettingsRepository::new())
            .oneshot(post(format!("/payments/{id}/approve"), Some("admin"), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(error_body(response).await.code, "already_processed");
    }

    #[tokio::test]
    async fn approve_returns_the_updated_request() {
        let id = Uuid::new_v4();
        let request = pending(id);
        let mut approved = request.clone();
        approved.status = PaymentRequestStatus::Approved.to_string();

        let mut reviews = MockPaymentReviewRepository::new();
        reviews
            .expect_find_by_id()
            .returning(move |_| Ok(Some(request.clone())));
        reviews
            .expect_approve_pending()
            .times(1)
            .returning(move |_| Ok(ReviewTransition::Applied(approved.clone())));
        let mut settings = MockSettingsRepository::new();
        settings
            .expect_list_plan_catalog()
            .returning(|| Ok(Vec::new()));

        let response = app(reviews, settings)
            .oneshot(post(format!("/payments/{id}/approve"), Some("admin"), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "approved");
    }

    #[tokio::test]
    async fn malformed_approve_body_is_400_without_writes() {
        let app = app(
            MockPaymentReviewRepository::new(),
            MockSettingsRepository::new(),
        );
        let token = issue_test_token(SECRET, Uuid::new_v4(), Some("admin"));
        let request = Request::builder()
            .method("POST")
            .uri(format!("/payments/{}/approve", Uuid::new_v4()))
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"reviewed_evidence_reference": 42"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!error_body(response).await.retryable);
    }

    #[test]
    fn approve_body_may_be_empty() {
        assert_eq!(
            parse_approve_body(b"").unwrap().reviewed_evidence_reference,
            None
        );
        assert_eq!(
            parse_approve_body(br#"{"reviewed_evidence_reference":"r/1.png"}"#)
                .unwrap()
                .reviewed_evidence_reference
                .as_deref(),
            Some("r/1.png")
        );
        assert!(parse_approve_body(b"not json").is_err());
    }

    #[test]
    fn status_filter_defaults_to_pending() {
        assert_eq!(
            parse_status_filter(None).unwrap(),
            Some(PaymentRequestStatus::Pending)
        );
        assert_eq!(parse_status_filter(Some("ALL")).unwrap(), None);
        assert!(parse_status_filter(Some("refunded")).is_err());
    }
}

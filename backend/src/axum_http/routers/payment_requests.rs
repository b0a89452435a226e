use std::sync::Arc;

use application::usecases::payment_review::PaymentReviewUseCase;
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use domain::value_objects::enums::plan_tiers::PlanTier;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{AuthConfig, AuthUser},
    axum_http::error_responses::AppError,
};

#[derive(Clone)]
pub struct PaymentRequestsState {
    pub auth: Arc<AuthConfig>,
    pub reviews: Arc<PaymentReviewUseCase>,
}

impl FromRef<PaymentRequestsState> for Arc<AuthConfig> {
    fn from_ref(state: &PaymentRequestsState) -> Self {
        Arc::clone(&state.auth)
    }
}

pub fn routes(state: PaymentRequestsState) -> Router {
    Router::new()
        .route("/", post(submit_payment_request))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub desired_plan_tier: String,
    pub evidence_reference: Option<String>,
}

pub async fn submit_payment_request(
    State(state): State<PaymentRequestsState>,
    user: AuthUser,
    Json(body): Json<SubmitPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tier = PlanTier::from_str(&body.desired_plan_tier).ok_or_else(|| {
        AppError::BadRequest(format!("unknown plan tier: {}", body.desired_plan_tier))
    })?;

    let id = state
        .reviews
        .submit(user.user_id, tier, body.evidence_reference)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

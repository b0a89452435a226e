use std::sync::Arc;

use application::usecases::entitlements::EntitlementUseCase;
use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    response::IntoResponse,
    routing::get,
};
use domain::value_objects::enums::plan_tiers::PlanTier;

use crate::{
    auth::{AuthConfig, AuthUser},
    axum_http::error_responses::AppError,
};

#[derive(Clone)]
pub struct EntitlementsState {
    pub auth: Arc<AuthConfig>,
    pub entitlements: Arc<EntitlementUseCase>,
}

impl FromRef<EntitlementsState> for Arc<AuthConfig> {
    fn from_ref(state: &EntitlementsState) -> Self {
        Arc::clone(&state.auth)
    }
}

pub fn routes(state: EntitlementsState) -> Router {
    Router::new()
        .route("/me", get(my_entitlement))
        .route("/me/access/:tier", get(check_access))
        .with_state(state)
}

pub async fn my_entitlement(
    State(state): State<EntitlementsState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let view = state.entitlements.current(user.user_id).await?;
    Ok(Json(view))
}

/// 200 with the entitlement when the effective tier covers `tier`, 403 otherwise.
pub async fn check_access(
    State(state): State<EntitlementsState>,
    user: AuthUser,
    Path(tier): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let required = PlanTier::from_str(&tier)
        .ok_or_else(|| AppError::BadRequest(format!("unknown plan tier: {tier}")))?;
    let view = state
        .entitlements
        .require_tier(user.user_id, required)
        .await?;
    Ok(Json(view))
}

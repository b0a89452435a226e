use std::sync::Arc;

use application::usecases::payment_webhook::{PaymentWebhookUseCase, WebhookError, WebhookRequest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/payments/webhooks/perfectpay" \
//     -H "Content-Type: application/json" \
//     -d '{"token":"...","sale_status_enum":2,"customer":{"email":"a@b.com"},
//          "product":{"name":"Plano Elite"},"sale_amount":97.0,"transaction_code":"PPCPMTB1"}'

pub fn routes(usecase: Arc<PaymentWebhookUseCase>) -> Router {
    Router::new()
        .route("/perfectpay", post(perfectpay_webhook))
        .with_state(usecase)
}

pub async fn perfectpay_webhook(
    State(usecase): State<Arc<PaymentWebhookUseCase>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_token = headers
        .get("token")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let request = WebhookRequest {
        body: body.to_vec(),
        header_token,
    };

    match usecase.handle(request).await {
        Ok(outcome) => {
            info!(outcome = outcome.label(), "payment_webhooks: delivery acknowledged");
            (StatusCode::OK, Json(json!({ "message": outcome.message() }))).into_response()
        }
        Err(err) => webhook_error_response(err),
    }
}

fn webhook_error_response(err: WebhookError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = ?err, "payment_webhooks: delivery failed, provider will retry");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

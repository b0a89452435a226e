use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use domain::{
    entities::{
        financial_transactions::InsertFinancialTransactionEntity,
        payment_requests::InsertPaymentRequestEntity,
    },
    repositories::{
        payment_ledger::PaymentLedgerRepository, settings::SettingsRepository,
        users::UserRepository,
    },
    value_objects::{
        audit_logs::{AuditActor, ENTITLEMENTS_TABLE, NewAuditEntry, PAYMENT_REQUESTS_TABLE},
        enums::{
            audit_actions::AuditAction,
            ledger_categories::{INCOME_KIND, LedgerCategory},
            payment_providers::PaymentProvider,
            payment_request_statuses::PaymentRequestStatus,
            plan_tiers::PlanTier,
        },
        payment_requests::{
            ExternalSettlement, PromotionActivation, SYSTEM_ACTOR, SettlementOutcome,
        },
        payment_webhooks::{RawWebhookPayload, WebhookEvent},
    },
};
use http::StatusCode;
use serde_json::json;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    store_call::{StoreCallError, store_call},
    usecases::{idempotency_guard::IdempotencyGuard, plan_resolver::PlanResolver},
};

const PROVIDER: PaymentProvider = PaymentProvider::PerfectPay;

#[derive(Debug, Clone)]
pub struct PaymentWebhookConfig {
    /// Settings key under which the shared webhook secret is stored.
    pub secret_key: String,
    pub promotion_period_days: i64,
    /// Lowercase substrings of a product name that mark an ads purchase.
    pub promotion_keywords: Vec<String>,
    pub fallback_amount_minor: i64,
    pub store_timeout: Duration,
    /// Whole-delivery budget; must stay below the server-wide request timeout.
    pub delivery_timeout: Duration,
}

/// One inbound delivery: the raw body and the `token` header if one was sent.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub body: Vec<u8>,
    pub header_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied {
        user_id: Uuid,
        plan_tier: PlanTier,
        plan_expires_at: Option<DateTime<Utc>>,
    },
    PromotionActivated {
        user_id: Uuid,
        promotion_expires_at: Option<DateTime<Utc>>,
    },
    Duplicate,
    IgnoredStatus {
        status: String,
    },
    IgnoredUnknownUser,
    IgnoredMissingTransaction,
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied { .. } => "applied",
            WebhookOutcome::PromotionActivated { .. } => "promotion_activated",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::IgnoredStatus { .. } => "ignored_status",
            WebhookOutcome::IgnoredUnknownUser => "ignored_unknown_user",
            WebhookOutcome::IgnoredMissingTransaction => "ignored_missing_transaction",
        }
    }

    /// Acknowledgement text returned to the provider.
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Applied { plan_tier, .. } => {
                format!("Payment applied: {plan_tier} plan activated")
            }
            WebhookOutcome::PromotionActivated { .. } => "Ads promotion activated".to_string(),
            WebhookOutcome::Duplicate => "Transaction already processed".to_string(),
            WebhookOutcome::IgnoredStatus { status } => {
                format!("Status ignored: {status}")
            }
            WebhookOutcome::IgnoredUnknownUser => "User not found, ignored".to_string(),
            WebhookOutcome::IgnoredMissingTransaction => {
                "Transaction id missing, ignored".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook secret is not configured")]
    SecretNotConfigured,
    #[error("invalid webhook token")]
    Unauthorized,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SecretNotConfigured | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreCallError> for WebhookError {
    fn from(err: StoreCallError) -> Self {
        match err {
            StoreCallError::Timeout { label, .. } => WebhookError::Timeout(label),
            StoreCallError::Failed(err) => WebhookError::Internal(err),
        }
    }
}

pub type WebhookResult<T> = std::result::Result<T, WebhookError>;

/// Reconciles provider sale notifications into entitlements.
///
/// Gates run in a fixed order: secret lookup, payload parsing, token check,
/// status classification, user lookup, transaction id, idempotency guard.
/// Only a delivery that clears every gate writes anything, and it writes
/// everything in one transaction.
pub struct PaymentWebhookUseCase {
    settings: Arc<dyn SettingsRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    ledger: Arc<dyn PaymentLedgerRepository + Send + Sync>,
    plan_resolver: PlanResolver,
    idempotency_guard: IdempotencyGuard,
    config: PaymentWebhookConfig,
}

impl PaymentWebhookUseCase {
    pub fn new(
        settings: Arc<dyn SettingsRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        ledger: Arc<dyn PaymentLedgerRepository + Send + Sync>,
        plan_resolver: PlanResolver,
        config: PaymentWebhookConfig,
    ) -> Self {
        let idempotency_guard = IdempotencyGuard::new(Arc::clone(&ledger), config.store_timeout);
        Self {
            settings,
            users,
            ledger,
            plan_resolver,
            idempotency_guard,
            config,
        }
    }

    pub async fn handle(&self, request: WebhookRequest) -> WebhookResult<WebhookOutcome> {
        match tokio::time::timeout(self.config.delivery_timeout, self.process(request)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    timeout_ms = self.config.delivery_timeout.as_millis() as u64,
                    "payment_webhook: delivery exceeded its deadline"
                );
                Err(WebhookError::Timeout("webhook.delivery"))
            }
        }
    }

    async fn process(&self, request: WebhookRequest) -> WebhookResult<WebhookOutcome> {
        let expected_secret = self.load_secret().await?;

        let payload: RawWebhookPayload = serde_json::from_slice(&request.body).map_err(|err| {
            warn!(error = %err, "payment_webhook: payload is not valid JSON");
            WebhookError::InvalidPayload(err.to_string())
        })?;

        let provided = payload.body_token().or(request.header_token);
        if !tokens_match(provided.as_deref(), &expected_secret) {
            warn!(
                token_present = provided.is_some(),
                "payment_webhook: rejected delivery with invalid token"
            );
            return Err(WebhookError::Unauthorized);
        }

        let event = WebhookEvent::from_raw(&payload);

        if !event.status.is_settled() {
            let status = event.status.describe();
            info!(
                outcome = "ignored_status",
                sale_status = %status,
                transaction_id = ?event.transaction_id,
                "payment_webhook: sale status is not settled"
            );
            return Ok(WebhookOutcome::IgnoredStatus { status });
        }

        let Some(user_id) = self.find_user(&event).await? else {
            warn!(
                outcome = "ignored_unknown_user",
                transaction_id = ?event.transaction_id,
                "payment_webhook: no user matches the customer email"
            );
            return Ok(WebhookOutcome::IgnoredUnknownUser);
        };

        let Some(transaction_id) = event.transaction_id.clone() else {
            warn!(
                outcome = "ignored_missing_transaction",
                %user_id,
                "payment_webhook: settled sale carries no transaction id"
            );
            return Ok(WebhookOutcome::IgnoredMissingTransaction);
        };

        if self
            .idempotency_guard
            .already_applied(PROVIDER, &transaction_id)
            .await?
        {
            info!(
                outcome = "duplicate",
                %user_id,
                %transaction_id,
                "payment_webhook: transaction already applied"
            );
            return Ok(WebhookOutcome::Duplicate);
        }

        if self.is_promotion(&event.product_name) {
            return self
                .activate_promotion(user_id, &transaction_id, &event)
                .await;
        }

        self.settle(user_id, &transaction_id, &event).await
    }

    async fn load_secret(&self) -> WebhookResult<String> {
        let secret = store_call(
            self.config.store_timeout,
            "settings.get_configured_secret",
            self.settings.get_configured_secret(&self.config.secret_key),
        )
        .await
        .map_err(|err| {
            error!(db_error = ?err, "payment_webhook: failed to load webhook secret");
            WebhookError::from(err)
        })?;

        match secret.filter(|secret| !secret.trim().is_empty()) {
            Some(secret) => Ok(secret),
            None => {
                error!(
                    secret_key = %self.config.secret_key,
                    "payment_webhook: webhook secret is not configured"
                );
                Err(WebhookError::SecretNotConfigured)
            }
        }
    }

    async fn find_user(&self, event: &WebhookEvent) -> WebhookResult<Option<Uuid>> {
        let Some(email) = event.customer_email.as_deref() else {
            return Ok(None);
        };

        store_call(
            self.config.store_timeout,
            "users.find_user_by_email",
            self.users.find_user_by_email(email),
        )
        .await
        .map_err(|err| {
            error!(db_error = ?err, "payment_webhook: failed to look up customer");
            WebhookError::from(err)
        })
    }

    fn is_promotion(&self, product_name: &str) -> bool {
        let product_name = product_name.to_lowercase();
        self.config
            .promotion_keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .any(|keyword| !keyword.is_empty() && product_name.contains(&keyword))
    }

    async fn activate_promotion(
        &self,
        user_id: Uuid,
        transaction_id: &str,
        event: &WebhookEvent,
    ) -> WebhookResult<WebhookOutcome> {
        let now = Utc::now();
        let amount_minor = event
            .amount_minor
            .unwrap_or(self.config.fallback_amount_minor);
        let period_days = self.config.promotion_period_days;

        let activation = PromotionActivation {
            user_id,
            period_days,
            activated_at: now,
            ledger_entry: ledger_entry(
                user_id,
                LedgerCategory::Promotion,
                amount_minor,
                transaction_id,
                &event.product_name,
                now,
            ),
            audit_entry: NewAuditEntry {
                actor: AuditActor::System,
                action: AuditAction::AdsActivated,
                entity_table: ENTITLEMENTS_TABLE,
                entity_id: user_id,
                target_user_id: Some(user_id),
                details: json!({
                    "provider": PROVIDER.as_str(),
                    "transaction_id": transaction_id,
                    "product_name": event.product_name,
                    "amount_minor": amount_minor,
                    "period_days": period_days,
                }),
                created_at: now,
            }
            .into_entity(),
        };

        let outcome = store_call(
            self.config.store_timeout,
            "ledger.activate_promotion",
            self.ledger.activate_promotion(activation),
        )
        .await
        .map_err(|err| {
            error!(
                %user_id,
                transaction_id,
                db_error = ?err,
                "payment_webhook: failed to activate promotion"
            );
            WebhookError::from(err)
        })?;

        match outcome {
            SettlementOutcome::Applied(applied) => {
                info!(
                    outcome = "promotion_activated",
                    %user_id,
                    transaction_id,
                    promotion_expires_at = ?applied.promotion_expires_at,
                    "payment_webhook: ads promotion activated"
                );
                Ok(WebhookOutcome::PromotionActivated {
                    user_id,
                    promotion_expires_at: applied.promotion_expires_at,
                })
            }
            SettlementOutcome::Duplicate => {
                info!(
                    outcome = "duplicate",
                    %user_id,
                    transaction_id,
                    "payment_webhook: concurrent delivery already activated the promotion"
                );
                Ok(WebhookOutcome::Duplicate)
            }
        }
    }

    async fn settle(
        &self,
        user_id: Uuid,
        transaction_id: &str,
        event: &WebhookEvent,
    ) -> WebhookResult<WebhookOutcome> {
        let plan = self.plan_resolver.resolve(&event.product_name).await?;
        if !plan.tier.is_paid() {
            warn!(
                %user_id,
                transaction_id,
                product_name = %event.product_name,
                "payment_webhook: product does not map to a paid tier, recording payment only"
            );
        }

        let now = Utc::now();
        let amount_minor = event
            .amount_minor
            .or(plan.price_minor)
            .unwrap_or(self.config.fallback_amount_minor);
        let payment_request_id = Uuid::new_v4();

        let settlement = ExternalSettlement {
            user_id,
            tier: plan.tier,
            validity_days: plan.validity_days,
            settled_at: now,
            ledger_entry: ledger_entry(
                user_id,
                LedgerCategory::Subscription,
                amount_minor,
                transaction_id,
                &event.product_name,
                now,
            ),
            payment_request: InsertPaymentRequestEntity {
                id: payment_request_id,
                user_id,
                provider: PROVIDER.to_string(),
                desired_plan_tier: plan.tier.to_string(),
                status: PaymentRequestStatus::Approved.to_string(),
                amount_minor: Some(amount_minor),
                requested_at: now,
                processed_at: Some(now),
                processed_by: Some(SYSTEM_ACTOR.to_string()),
                evidence_reference: None,
                external_transaction_id: Some(transaction_id.to_string()),
            },
            audit_entry: NewAuditEntry {
                actor: AuditActor::System,
                action: AuditAction::PaymentApproved,
                entity_table: PAYMENT_REQUESTS_TABLE,
                entity_id: payment_request_id,
                target_user_id: Some(user_id),
                details: json!({
                    "provider": PROVIDER.as_str(),
                    "transaction_id": transaction_id,
                    "product_name": event.product_name,
                    "plan_tier": plan.tier,
                    "validity_days": plan.validity_days,
                    "catalog_name": plan.catalog_name,
                    "amount_minor": amount_minor,
                }),
                created_at: now,
            }
            .into_entity(),
        };

        let outcome = store_call(
            self.config.store_timeout,
            "ledger.settle_external_payment",
            self.ledger.settle_external_payment(settlement),
        )
        .await
        .map_err(|err| {
            error!(
                %user_id,
                transaction_id,
                db_error = ?err,
                "payment_webhook: failed to settle payment"
            );
            WebhookError::from(err)
        })?;

        match outcome {
            SettlementOutcome::Applied(applied) => {
                info!(
                    outcome = "applied",
                    %user_id,
                    transaction_id,
                    plan_tier = %applied.plan_tier,
                    plan_expires_at = ?applied.plan_expires_at,
                    "payment_webhook: payment applied"
                );
                Ok(WebhookOutcome::Applied {
                    user_id,
                    plan_tier: applied.plan_tier,
                    plan_expires_at: applied.plan_expires_at,
                })
            }
            SettlementOutcome::Duplicate => {
                info!(
                    outcome = "duplicate",
                    %user_id,
                    transaction_id,
                    "payment_webhook: concurrent delivery already settled the transaction"
                );
                Ok(WebhookOutcome::Duplicate)
            }
        }
    }
}

fn tokens_match(provided: Option<&str>, expected: &str) -> bool {
    provided.is_some_and(|provided| bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
}

fn ledger_entry(
    user_id: Uuid,
    category: LedgerCategory,
    amount_minor: i64,
    transaction_id: &str,
    product_name: &str,
    created_at: DateTime<Utc>,
) -> InsertFinancialTransactionEntity {
    InsertFinancialTransactionEntity {
        id: Uuid::new_v4(),
        user_id,
        kind: INCOME_KIND.to_string(),
        category: category.to_string(),
        amount_minor,
        provider: PROVIDER.to_string(),
        reference_id: transaction_id.to_string(),
        description: (!product_name.is_empty()).then(|| product_name.to_string()),
        created_at,
    }
}

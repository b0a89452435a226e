use crate::{
    auth::AuthConfig,
    axum_http::{
        default_routers,
        routers::{
            self, admin_payments::AdminPaymentsState, entitlements::EntitlementsState,
            payment_requests::PaymentRequestsState,
        },
    },
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use application::usecases::{
    audit_trail::AuditTrailUseCase,
    entitlements::EntitlementUseCase,
    payment_review::PaymentReviewUseCase,
    payment_webhook::{PaymentWebhookConfig, PaymentWebhookUseCase},
    plan_resolver::PlanResolver,
};
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use domain::repositories::settings::SettingsRepository;
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        audit_logs::AuditLogPostgres, entitlements::EntitlementPostgres,
        payment_ledger::PaymentLedgerPostgres, payment_reviews::PaymentReviewPostgres,
        settings::SettingsPostgres, users::UserPostgres,
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let store_timeout = Duration::from_secs(config.payments.store_timeout_secs);

    let auth = Arc::new(AuthConfig {
        jwt_secret: config.supabase.jwt_secret.clone(),
        admin_roles: config.payments.admin_roles.clone(),
    });

    let settings: Arc<dyn SettingsRepository + Send + Sync> =
        Arc::new(SettingsPostgres::new(Arc::clone(&db_pool)));
    let plan_resolver = PlanResolver::new(
        Arc::clone(&settings),
        config.payments.default_validity_days,
        store_timeout,
    );

    let webhook_usecase = Arc::new(PaymentWebhookUseCase::new(
        settings,
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentLedgerPostgres::new(Arc::clone(&db_pool))),
        plan_resolver.clone(),
        PaymentWebhookConfig {
            secret_key: config.payments.webhook_secret_key.clone(),
            promotion_period_days: config.payments.promotion_period_days,
            promotion_keywords: config.payments.promotion_keywords.clone(),
            fallback_amount_minor: config.payments.fallback_amount_minor,
            store_timeout,
            delivery_timeout: config.backend_server.webhook_deadline(),
        },
    ));
    let review_usecase = Arc::new(PaymentReviewUseCase::new(
        Arc::new(PaymentReviewPostgres::new(Arc::clone(&db_pool))),
        plan_resolver,
        store_timeout,
    ));
    let audit_trail_usecase = Arc::new(AuditTrailUseCase::new(
        Arc::new(AuditLogPostgres::new(Arc::clone(&db_pool))),
        store_timeout,
    ));
    let entitlement_usecase = Arc::new(EntitlementUseCase::new(
        Arc::new(EntitlementPostgres::new(Arc::clone(&db_pool))),
        store_timeout,
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/payments/webhooks",
            routers::payment_webhooks::routes(webhook_usecase),
        )
        .nest(
            "/api/v1/admin",
            routers::admin_payments::routes(AdminPaymentsState {
                auth: Arc::clone(&auth),
                reviews: Arc::clone(&review_usecase),
                audit_trail: audit_trail_usecase,
            }),
        )
        .nest(
            "/api/v1/payment-requests",
            routers::payment_requests::routes(PaymentRequestsState {
                auth: Arc::clone(&auth),
                reviews: review_usecase,
            }),
        )
        .nest(
            "/api/v1/entitlements",
            routers::entitlements::routes(EntitlementsState {
                auth,
                entitlements: entitlement_usecase,
            }),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "http_serve: backend listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM signal handler");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

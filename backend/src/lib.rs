pub mod auth;
pub mod axum_http;
pub mod config;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use infra::{observability, postgres::postgres_connection};
use tracing::info;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("backend")?;

    let stage = config::config_loader::get_stage();
    info!(%stage, "backend: starting");

    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.pool_max_size,
        Duration::from_secs(dotenvy_env.payments.store_timeout_secs),
    )?;
    info!("Postgres connection has been established");

    axum_http::http_serve::start(Arc::new(dotenvy_env), Arc::new(postgres_pool)).await?;

    Ok(())
}

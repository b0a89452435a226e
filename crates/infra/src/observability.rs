use std::env;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub service_name: String,
    pub environment: String,
    pub component: String,
}

impl ServiceContext {
    pub fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();
        let service_name = env_string("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = env_string("STAGE").unwrap_or_else(|| "unknown".to_string());

        Self {
            service_name,
            environment,
            component,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_observability(component: &str) -> Result<ServiceContext> {
    let context = ServiceContext::from_env(component);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ` shows up as an offset in the timestamps.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        "observability: tracing initialised"
    );

    Ok(context)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

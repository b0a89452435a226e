use std::time::Duration;

/// Slack left between the webhook deadline and the server-wide timeout.
const WEBHOOK_DEADLINE_MARGIN: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub payments: Payments,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

impl BackendServer {
    /// Webhook deliveries give up before the server-wide timeout would turn
    /// them into a bare 408.
    pub fn webhook_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout)
            .saturating_sub(WEBHOOK_DEADLINE_MARGIN)
            .max(WEBHOOK_DEADLINE_MARGIN)
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_max_size: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Payments {
    /// `app_settings` key holding the shared webhook secret.
    pub webhook_secret_key: String,
    pub store_timeout_secs: u64,
    pub default_validity_days: i64,
    pub promotion_period_days: i64,
    pub promotion_keywords: Vec<String>,
    pub fallback_amount_minor: i64,
    /// `app_metadata.role` values allowed on the admin routes.
    pub admin_roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(timeout: u64) -> BackendServer {
        BackendServer {
            port: 8080,
            body_limit: 1,
            timeout,
        }
    }

    #[test]
    fn webhook_deadline_lands_inside_the_server_timeout() {
        assert_eq!(server(30).webhook_deadline(), Duration::from_millis(29_500));
        assert_eq!(server(1).webhook_deadline(), Duration::from_millis(500));
        assert!(server(10).webhook_deadline() < Duration::from_secs(10));
    }
}

use anyhow::{Context, Result};

use super::{
    config_model::{BackendServer, Database, DotEnvyConfig, Payments, Supabase},
    stage::Stage,
};

pub const DEFAULT_WEBHOOK_SECRET_KEY: &str = "perfectpay_webhook_token";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
        pool_max_size: std::env::var("DATABASE_POOL_MAX_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_POOL_MAX_SIZE is invalid")?,
    };

    let supabase = Supabase {
        jwt_secret: std::env::var("SUPABASE_JWT_SECRET").expect("SUPABASE_JWT_SECRET is invalid"),
    };

    let payments = Payments {
        webhook_secret_key: std::env::var("PAYMENT_WEBHOOK_SECRET_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_SECRET_KEY.to_string()),
        store_timeout_secs: std::env::var("PAYMENT_STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .context("PAYMENT_STORE_TIMEOUT_SECS is invalid")?
            .clamp(1, 9),
        default_validity_days: positive_days("PAYMENT_DEFAULT_VALIDITY_DAYS", 30)?,
        promotion_period_days: positive_days("PAYMENT_PROMOTION_PERIOD_DAYS", 30)?,
        promotion_keywords: csv_list("PAYMENT_PROMOTION_KEYWORDS", "anuncio,anúncio,ads"),
        fallback_amount_minor: std::env::var("PAYMENT_FALLBACK_AMOUNT_MINOR")
            .unwrap_or_else(|_| "0".to_string())
            .parse::<i64>()
            .context("PAYMENT_FALLBACK_AMOUNT_MINOR is invalid")?
            .max(0),
        admin_roles: csv_list("ADMIN_ROLES", "admin"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        payments,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or_default();
    Stage::try_from(stage_str.as_str()).unwrap_or_default()
}

fn positive_days(key: &str, default: i64) -> Result<i64> {
    let days = match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{key} is invalid"))?,
        Err(_) => default,
    };
    anyhow::ensure!(days > 0, "{key} must be positive");
    Ok(days)
}

fn csv_list(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_list_falls_back_to_default() {
        let keywords = csv_list("PAYMENT_PROMOTION_KEYWORDS_UNSET_FOR_TEST", "Anuncio, ads ,,");
        assert_eq!(keywords, vec!["anuncio".to_string(), "ads".to_string()]);
    }

    #[test]
    fn positive_days_uses_default_when_unset() {
        assert_eq!(positive_days("PAYMENT_DAYS_UNSET_FOR_TEST", 30).unwrap(), 30);
    }
}

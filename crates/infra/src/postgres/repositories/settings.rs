use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use domain::{
    entities::plans::SubscriptionPlanEntity,
    repositories::settings::SettingsRepository,
    schema::{app_settings, subscription_plans},
    value_objects::plans::PlanCatalogEntry,
};

use crate::postgres::postgres_connection::{PgPoolSquad, with_connection};

pub struct SettingsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SettingsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SettingsRepository for SettingsPostgres {
    async fn get_configured_secret(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();

        with_connection(&self.db_pool, move |conn| {
            let value = app_settings::table
                .find(key)
                .select(app_settings::value)
                .first::<String>(conn)
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn list_plan_catalog(&self) -> Result<Vec<PlanCatalogEntry>> {
        with_connection(&self.db_pool, |conn| {
            let plans = subscription_plans::table
                .filter(subscription_plans::is_active.eq(true))
                .order(subscription_plans::name.asc())
                .select(SubscriptionPlanEntity::as_select())
                .load(conn)?;
            Ok(plans.into_iter().map(PlanCatalogEntry::from).collect())
        })
        .await
    }
}

use diesel::prelude::*;
use uuid::Uuid;

use crate::{schema::subscription_plans, value_objects::plans::PlanCatalogEntry};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct SubscriptionPlanEntity {
    pub id: Uuid,
    pub name: String,
    pub validity_days: i32,
    pub price_minor: Option<i64>,
    pub is_active: bool,
}

impl From<SubscriptionPlanEntity> for PlanCatalogEntry {
    fn from(value: SubscriptionPlanEntity) -> Self {
        Self {
            name: value.name,
            validity_days: i64::from(value.validity_days),
            price_minor: value.price_minor,
        }
    }
}

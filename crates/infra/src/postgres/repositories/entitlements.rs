use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    insert_into,
    pg::Pg,
    prelude::*,
    query_builder::{QueryFragment, QueryId},
};
use domain::{
    entities::entitlements::EntitlementEntity, repositories::entitlements::EntitlementRepository,
    schema::entitlements, value_objects::enums::plan_tiers::PlanTier,
};
use uuid::Uuid;

use crate::postgres::postgres_connection::{PgPoolSquad, with_connection};

pub struct EntitlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EntitlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EntitlementRepository for EntitlementPostgres {
    async fn get_entitlement(&self, user_id: Uuid) -> Result<Option<EntitlementEntity>> {
        with_connection(&self.db_pool, move |conn| {
            let entitlement = entitlements::table
                .find(user_id)
                .select(EntitlementEntity::as_select())
                .first(conn)
                .optional()?;
            Ok(entitlement)
        })
        .await
    }
}

/// Free placeholder row for a first-time buyer. A no-op when the user already has one.
pub(crate) fn ensure_entitlement_row(
    user_id: Uuid,
    now: DateTime<Utc>,
) -> impl RunQueryDsl<PgConnection> + QueryFragment<Pg> + QueryId {
    insert_into(entitlements::table)
        .values((
            entitlements::user_id.eq(user_id),
            entitlements::plan_tier.eq(PlanTier::Free.to_string()),
            entitlements::updated_at.eq(now),
        ))
        .on_conflict(entitlements::user_id)
        .do_nothing()
}

/// Current row for `user_id`, locked until the surrounding transaction ends.
/// The row is created first so concurrent writers for a new user serialize on it.
pub(crate) fn lock_entitlement(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<EntitlementEntity> {
    ensure_entitlement_row(user_id, now).execute(conn)?;

    entitlements::table
        .find(user_id)
        .select(EntitlementEntity::as_select())
        .for_update()
        .first(conn)
}

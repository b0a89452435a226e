//! Helpers for the repository tests that need a migrated Postgres.
//! Those tests are `#[ignore]`d; run them with
//! `DATABASE_URL=... cargo test -p infra -- --ignored`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*};
use domain::{
    entities::{
        audit_logs::InsertAuditLogEntity,
        financial_transactions::InsertFinancialTransactionEntity,
        payment_requests::InsertPaymentRequestEntity,
    },
    schema::profiles,
    value_objects::{
        audit_logs::{AuditActor, NewAuditEntry, PAYMENT_REQUESTS_TABLE},
        enums::{
            audit_actions::AuditAction,
            ledger_categories::{INCOME_KIND, LedgerCategory},
            payment_providers::PaymentProvider,
            payment_request_statuses::PaymentRequestStatus,
            plan_tiers::PlanTier,
        },
    },
};
use serde_json::json;
use uuid::Uuid;

use crate::postgres::postgres_connection::{PgPoolSquad, establish_connection};

pub(crate) fn test_pool() -> Arc<PgPoolSquad> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a migrated database");
    Arc::new(establish_connection(&url, 4, Duration::from_secs(5)).unwrap())
}

pub(crate) fn insert_profile(db_pool: &PgPoolSquad) -> Uuid {
    let id = Uuid::new_v4();
    let mut conn = db_pool.get().unwrap();
    insert_into(profiles::table)
        .values((
            profiles::id.eq(id),
            profiles::email.eq(format!("{id}@example.com")),
        ))
        .execute(&mut conn)
        .unwrap();
    id
}

pub(crate) fn ledger_entry(
    user_id: Uuid,
    reference_id: &str,
    created_at: DateTime<Utc>,
) -> InsertFinancialTransactionEntity {
    InsertFinancialTransactionEntity {
        id: Uuid::new_v4(),
        user_id,
        kind: INCOME_KIND.to_string(),
        category: LedgerCategory::Subscription.to_string(),
        amount_minor: 9_700,
        provider: PaymentProvider::PerfectPay.to_string(),
        reference_id: reference_id.to_string(),
        description: Some("Plano Elite".to_string()),
        created_at,
    }
}

pub(crate) fn approved_request(
    user_id: Uuid,
    reference_id: &str,
    now: DateTime<Utc>,
) -> InsertPaymentRequestEntity {
    InsertPaymentRequestEntity {
        id: Uuid::new_v4(),
        user_id,
        provider: PaymentProvider::PerfectPay.to_string(),
        desired_plan_tier: PlanTier::Elite.to_string(),
        status: PaymentRequestStatus::Approved.to_string(),
        amount_minor: Some(9_700),
        requested_at: now,
        processed_at: Some(now),
        processed_by: Some("system".to_string()),
        evidence_reference: None,
        external_transaction_id: Some(reference_id.to_string()),
    }
}

pub(crate) fn pending_request(user_id: Uuid, now: DateTime<Utc>) -> InsertPaymentRequestEntity {
    InsertPaymentRequestEntity {
        id: Uuid::new_v4(),
        user_id,
        provider: PaymentProvider::Manual.to_string(),
        desired_plan_tier: PlanTier::Advance.to_string(),
        status: PaymentRequestStatus::Pending.to_string(),
        amount_minor: None,
        requested_at: now,
        processed_at: None,
        processed_by: None,
        evidence_reference: Some("receipts/1.png".to_string()),
        external_transaction_id: None,
    }
}

pub(crate) fn audit_entry(
    action: AuditAction,
    entity_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> InsertAuditLogEntity {
    NewAuditEntry {
        actor: AuditActor::System,
        action,
        entity_table: PAYMENT_REQUESTS_TABLE,
        entity_id,
        target_user_id: Some(user_id),
        details: json!({}),
        created_at: now,
    }
    .into_entity()
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    dsl::exists,
    insert_into,
    pg::Pg,
    prelude::*,
    query_builder::{QueryFragment, QueryId},
    select, update,
};
use domain::{
    entities::financial_transactions::InsertFinancialTransactionEntity,
    repositories::payment_ledger::PaymentLedgerRepository,
    schema::{entitlements, financial_transactions, payment_requests},
    value_objects::{
        entitlements::{extend_promotion, renew},
        enums::{ledger_categories::INCOME_KIND, payment_providers::PaymentProvider},
        payment_requests::{
            AppliedSettlement, ExternalSettlement, PromotionActivation, SettlementOutcome,
        },
    },
};
use tracing::info;

use crate::postgres::{
    postgres_connection::{PgPoolSquad, with_connection},
    repositories::{audit_logs::append_audit_entry, entitlements::lock_entitlement},
};

pub struct PaymentLedgerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentLedgerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentLedgerRepository for PaymentLedgerPostgres {
    async fn find_income_ledger_entry(
        &self,
        provider: PaymentProvider,
        reference_id: &str,
    ) -> Result<bool> {
        let reference_id = reference_id.to_string();

        with_connection(&self.db_pool, move |conn| {
            let found = select(exists(
                financial_transactions::table
                    .filter(financial_transactions::provider.eq(provider.as_str()))
                    .filter(financial_transactions::reference_id.eq(reference_id))
                    .filter(financial_transactions::kind.eq(INCOME_KIND)),
            ))
            .get_result::<bool>(conn)?;
            Ok(found)
        })
        .await
    }

    async fn settle_external_payment(
        &self,
        settlement: ExternalSettlement,
    ) -> Result<SettlementOutcome> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                if !claim_ledger_key(tx, &settlement.ledger_entry)? {
                    return Ok(SettlementOutcome::Duplicate);
                }

                let current = lock_entitlement(tx, settlement.user_id, settlement.settled_at)?;
                let renewal = renew(
                    Some(&current),
                    settlement.tier,
                    settlement.validity_days,
                    settlement.settled_at,
                );
                let promotion_expires_at = current.promotion_expires_at;

                update(entitlements::table.find(settlement.user_id))
                    .set((
                        entitlements::plan_tier.eq(renewal.tier.to_string()),
                        entitlements::plan_expires_at.eq(renewal.expires_at),
                        entitlements::updated_at.eq(settlement.settled_at),
                    ))
                    .execute(tx)?;

                insert_into(payment_requests::table)
                    .values(&settlement.payment_request)
                    .execute(tx)?;

                append_audit_entry(tx, &settlement.audit_entry)?;

                info!(
                    user_id = %settlement.user_id,
                    reference_id = %settlement.ledger_entry.reference_id,
                    plan_tier = %renewal.tier,
                    plan_expires_at = ?renewal.expires_at,
                    "payment_ledger: external payment settled"
                );

                Ok(SettlementOutcome::Applied(AppliedSettlement {
                    payment_request_id: Some(settlement.payment_request.id),
                    plan_tier: renewal.tier,
                    plan_expires_at: renewal.expires_at,
                    promotion_expires_at,
                }))
            })
        })
        .await
    }

    async fn activate_promotion(
        &self,
        activation: PromotionActivation,
    ) -> Result<SettlementOutcome> {
        with_connection(&self.db_pool, move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|tx| {
                if !claim_ledger_key(tx, &activation.ledger_entry)? {
                    return Ok(SettlementOutcome::Duplicate);
                }

                let current = lock_entitlement(tx, activation.user_id, activation.activated_at)?;
                let promotion_expires_at = extend_promotion(
                    current.promotion_expires_at,
                    activation.period_days,
                    activation.activated_at,
                );
                let plan_tier = current.stored_tier();
                let plan_expires_at = current.plan_expires_at;

                update(entitlements::table.find(activation.user_id))
                    .set((
                        entitlements::promotion_expires_at.eq(Some(promotion_expires_at)),
                        entitlements::updated_at.eq(activation.activated_at),
                    ))
                    .execute(tx)?;

                append_audit_entry(tx, &activation.audit_entry)?;

                info!(
                    user_id = %activation.user_id,
                    reference_id = %activation.ledger_entry.reference_id,
                    %promotion_expires_at,
                    "payment_ledger: promotion activated"
                );

                Ok(SettlementOutcome::Applied(AppliedSettlement {
                    payment_request_id: None,
                    plan_tier,
                    plan_expires_at,
                    promotion_expires_at: Some(promotion_expires_at),
                }))
            })
        })
        .await
    }
}

/// Inserts the income row unless `(provider, reference_id)` already exists.
/// `false` means another delivery got there first.
fn claim_ledger_key(
    conn: &mut PgConnection,
    entry: &InsertFinancialTransactionEntity,
) -> QueryResult<bool> {
    let inserted = claim_ledger_key_statement(entry).execute(conn)?;
    Ok(inserted == 1)
}

fn claim_ledger_key_statement(
    entry: &InsertFinancialTransactionEntity,
) -> impl RunQueryDsl<PgConnection> + QueryFragment<Pg> + QueryId + '_ {
    insert_into(financial_transactions::table)
        .values(entry)
        .on_conflict((
            financial_transactions::provider,
            financial_transactions::reference_id,
        ))
        .do_nothing()
}

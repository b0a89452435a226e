use std::{sync::Arc, time::Duration};

use domain::{
    repositories::payment_ledger::PaymentLedgerRepository,
    value_objects::enums::payment_providers::PaymentProvider,
};
use tracing::{error, info};

use crate::store_call::{StoreCallError, store_call};

/// Answers whether an external transaction has already produced its income
/// entry. The storage-level unique key on the ledger backs this check up
/// when two deliveries race past it.
#[derive(Clone)]
pub struct IdempotencyGuard {
    ledger: Arc<dyn PaymentLedgerRepository + Send + Sync>,
    store_timeout: Duration,
}

impl IdempotencyGuard {
    pub fn new(
        ledger: Arc<dyn PaymentLedgerRepository + Send + Sync>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            store_timeout,
        }
    }

    pub async fn already_applied(
        &self,
        provider: PaymentProvider,
        external_transaction_id: &str,
    ) -> Result<bool, StoreCallError> {
        let applied = store_call(
            self.store_timeout,
            "ledger.find_income_ledger_entry",
            self.ledger
                .find_income_ledger_entry(provider, external_transaction_id),
        )
        .await
        .map_err(|err| {
            error!(
                %provider,
                transaction_id = external_transaction_id,
                error = %err,
                "idempotency_guard: ledger lookup failed"
            );
            err
        })?;

        if applied {
            info!(
                %provider,
                transaction_id = external_transaction_id,
                "idempotency_guard: transaction already applied"
            );
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::payment_ledger::MockPaymentLedgerRepository;

    #[tokio::test]
    async fn reports_existing_income_entry() {
        let mut ledger = MockPaymentLedgerRepository::new();
        ledger
            .expect_find_income_ledger_entry()
            .withf(|provider, reference| {
                *provider == PaymentProvider::PerfectPay && reference == "TX1"
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let guard = IdempotencyGuard::new(Arc::new(ledger), Duration::from_secs(1));

        assert!(
            guard
                .already_applied(PaymentProvider::PerfectPay, "TX1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unseen_transaction_is_not_applied() {
        let mut ledger = MockPaymentLedgerRepository::new();
        ledger
            .expect_find_income_ledger_entry()
            .returning(|_, _| Ok(false));

        let guard = IdempotencyGuard::new(Arc::new(ledger), Duration::from_secs(1));

        assert!(
            !guard
                .already_applied(PaymentProvider::PerfectPay, "TX2")
                .await
                .unwrap()
        );
    }
}

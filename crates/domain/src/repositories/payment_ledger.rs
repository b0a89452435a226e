use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::value_objects::{
    enums::payment_providers::PaymentProvider,
    payment_requests::{ExternalSettlement, PromotionActivation, SettlementOutcome},
};

#[automock]
#[async_trait]
pub trait PaymentLedgerRepository {
    /// Whether an income entry already references this external transaction.
    async fn find_income_ledger_entry(
        &self,
        provider: PaymentProvider,
        reference_id: &str,
    ) -> Result<bool>;

    /// Ledger entry, entitlement renewal, approved payment request and audit
    /// entry in one transaction. Returns `Duplicate` when the ledger key exists.
    async fn settle_external_payment(
        &self,
        settlement: ExternalSettlement,
    ) -> Result<SettlementOutcome>;

    /// Ledger entry, promotion extension and audit entry in one transaction.
    async fn activate_promotion(&self, activation: PromotionActivation)
    -> Result<SettlementOutcome>;
}

use std::{sync::Arc, time::Duration};

use domain::{
    repositories::settings::SettingsRepository,
    value_objects::{
        enums::plan_tiers::PlanTier,
        plans::{PlanCatalogEntry, ResolvedPlan, resolve_known_tier, resolve_plan},
    },
};
use tracing::{debug, error};

use crate::store_call::{StoreCallError, store_call};

/// Maps provider plan labels onto internal tiers using the configured catalog
/// for validity overrides. Matching itself never fails; only the catalog read can.
#[derive(Clone)]
pub struct PlanResolver {
    settings: Arc<dyn SettingsRepository + Send + Sync>,
    default_validity_days: i64,
    store_timeout: Duration,
}

impl PlanResolver {
    pub fn new(
        settings: Arc<dyn SettingsRepository + Send + Sync>,
        default_validity_days: i64,
        store_timeout: Duration,
    ) -> Self {
        Self {
            settings,
            default_validity_days,
            store_timeout,
        }
    }

    pub async fn resolve(&self, raw_label: &str) -> Result<ResolvedPlan, StoreCallError> {
        let catalog = self.catalog().await?;
        let resolved = resolve_plan(raw_label, &catalog, self.default_validity_days);
        debug!(
            raw_label,
            tier = %resolved.tier,
            validity_days = resolved.validity_days,
            catalog_name = ?resolved.catalog_name,
            "plan_resolver: label resolved"
        );
        Ok(resolved)
    }

    /// Validity for a tier that is already known, e.g. from a manual request.
    pub async fn resolve_tier(&self, tier: PlanTier) -> Result<ResolvedPlan, StoreCallError> {
        let catalog = self.catalog().await?;
        Ok(resolve_known_tier(tier, &catalog, self.default_validity_days))
    }

    async fn catalog(&self) -> Result<Vec<PlanCatalogEntry>, StoreCallError> {
        store_call(
            self.store_timeout,
            "settings.list_plan_catalog",
            self.settings.list_plan_catalog(),
        )
        .await
        .map_err(|err| {
            error!(error = %err, "plan_resolver: failed to load plan catalog");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::settings::MockSettingsRepository;

    fn resolver(settings: MockSettingsRepository) -> PlanResolver {
        PlanResolver::new(Arc::new(settings), 30, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn applies_catalog_validity() {
        let mut settings = MockSettingsRepository::new();
        settings.expect_list_plan_catalog().times(1).returning(|| {
            Ok(vec![PlanCatalogEntry {
                name: "Elite Black".to_string(),
                validity_days: 365,
                price_minor: Some(99_700),
            }])
        });

        let resolved = resolver(settings).resolve("Elite Black").await.unwrap();

        assert_eq!(resolved.tier, PlanTier::Elite);
        assert_eq!(resolved.validity_days, 365);
        assert_eq!(resolved.price_minor, Some(99_700));
    }

    #[tokio::test]
    async fn unknown_label_degrades_to_free() {
        let mut settings = MockSettingsRepository::new();
        settings
            .expect_list_plan_catalog()
            .returning(|| Ok(Vec::new()));

        let resolved = resolver(settings).resolve("Mystery box").await.unwrap();

        assert_eq!(resolved.tier, PlanTier::Free);
        assert_eq!(resolved.validity_days, 30);
    }

    #[tokio::test]
    async fn resolve_tier_keeps_the_requested_tier() {
        let mut settings = MockSettingsRepository::new();
        settings.expect_list_plan_catalog().returning(|| {
            Ok(vec![PlanCatalogEntry {
                name: "Advance".to_string(),
                validity_days: 45,
                price_minor: None,
            }])
        });

        let resolved = resolver(settings)
            .resolve_tier(PlanTier::Advance)
            .await
            .unwrap();

        assert_eq!(resolved.tier, PlanTier::Advance);
        assert_eq!(resolved.validity_days, 45);
    }

    #[tokio::test]
    async fn catalog_failure_is_reported() {
        let mut settings = MockSettingsRepository::new();
        settings
            .expect_list_plan_catalog()
            .returning(|| Err(anyhow::anyhow!("db down")));

        let err = resolver(settings).resolve("Elite").await.unwrap_err();

        assert!(matches!(err, StoreCallError::Failed(_)));
    }

    #[tokio::test]
    async fn resolve_tier_ignores_longer_catalog_names() {
        let mut settings = MockSettingsRepository::new();
        settings.expect_list_plan_catalog().returning(|| {
            Ok(vec![
                PlanCatalogEntry {
                    name: "Advance Mensal".to_string(),
                    validity_days: 30,
                    price_minor: None,
                },
                PlanCatalogEntry {
                    name: "Advance Anual".to_string(),
                    validity_days: 365,
                    price_minor: None,
                },
            ])
        });

        let resolved = resolver(settings)
            .resolve_tier(PlanTier::Advance)
            .await
            .unwrap();

        assert_eq!(resolved.tier, PlanTier::Advance);
        assert_eq!(resolved.validity_days, 30);
        assert_eq!(resolved.catalog_name, None);
    }
}

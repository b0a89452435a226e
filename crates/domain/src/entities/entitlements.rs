use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{schema::entitlements, value_objects::enums::plan_tiers::PlanTier};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = entitlements, primary_key(user_id))]
pub struct EntitlementEntity {
    pub user_id: Uuid,
    pub plan_tier: String,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub promotion_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl EntitlementEntity {
    /// Stored tier; unknown values read as free.
    pub fn stored_tier(&self) -> PlanTier {
        PlanTier::from_str(&self.plan_tier).unwrap_or_default()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.stored_tier().is_paid() && self.plan_expires_at.is_some_and(|expires| expires > now)
    }

    /// Tier that gates features. A lapsed paid plan is free; nothing downgrades the row.
    pub fn effective_tier(&self, now: DateTime<Utc>) -> PlanTier {
        if self.is_active(now) {
            self.stored_tier()
        } else {
            PlanTier::Free
        }
    }

    pub fn grants(&self, required: PlanTier, now: DateTime<Utc>) -> bool {
        self.effective_tier(now) >= required
    }

    pub fn promotion_active(&self, now: DateTime<Utc>) -> bool {
        self.promotion_expires_at.is_some_and(|expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entitlement(tier: PlanTier, expires_at: Option<DateTime<Utc>>) -> EntitlementEntity {
        EntitlementEntity {
            user_id: Uuid::new_v4(),
            plan_tier: tier.to_string(),
            plan_expires_at: expires_at,
            promotion_expires_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lapsed_elite_is_treated_as_free() {
        let now = Utc::now();
        let lapsed = entitlement(PlanTier::Elite, Some(now - Duration::minutes(1)));
        let free = entitlement(PlanTier::Free, None);

        assert_eq!(lapsed.effective_tier(now), PlanTier::Free);
        assert_eq!(lapsed.effective_tier(now), free.effective_tier(now));
        assert!(!lapsed.grants(PlanTier::Advance, now));
        assert_eq!(
            lapsed.grants(PlanTier::Free, now),
            free.grants(PlanTier::Free, now)
        );
    }

    #[test]
    fn paid_tier_without_expiry_is_free() {
        let now = Utc::now();
        let row = entitlement(PlanTier::Advance, None);
        assert!(!row.is_active(now));
        assert_eq!(row.effective_tier(now), PlanTier::Free);
    }

    #[test]
    fn active_elite_grants_lower_tiers() {
        let now = Utc::now();
        let row = entitlement(PlanTier::Elite, Some(now + Duration::days(3)));
        assert!(row.grants(PlanTier::Advance, now));
        assert!(row.grants(PlanTier::Elite, now));
    }

    #[test]
    fn unknown_stored_tier_reads_as_free() {
        let now = Utc::now();
        let mut row = entitlement(PlanTier::Elite, Some(now + Duration::days(3)));
        row.plan_tier = "platinum".to_string();
        assert_eq!(row.effective_tier(now), PlanTier::Free);
    }
}

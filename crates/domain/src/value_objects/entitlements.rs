use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{entities::entitlements::EntitlementEntity, value_objects::enums::plan_tiers::PlanTier};

/// Entitlement state after a renewal has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementRenewal {
    pub tier: PlanTier,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Extend-only renewal: the new period starts at the current expiry while the
/// plan is still active, otherwise at `now`. A free resolution leaves the
/// current entitlement untouched.
pub fn renew(
    current: Option<&EntitlementEntity>,
    tier: PlanTier,
    validity_days: i64,
    now: DateTime<Utc>,
) -> EntitlementRenewal {
    if !tier.is_paid() {
        return match current {
            Some(current) => EntitlementRenewal {
                tier: current.stored_tier(),
                expires_at: current.plan_expires_at,
            },
            None => EntitlementRenewal {
                tier: PlanTier::Free,
                expires_at: None,
            },
        };
    }

    let starts_at = current
        .filter(|current| current.is_active(now))
        .and_then(|current| current.plan_expires_at)
        .map_or(now, |expires| expires.max(now));

    EntitlementRenewal {
        tier,
        expires_at: Some(starts_at + Duration::days(validity_days.max(1))),
    }
}

/// Promotions stack the same way: max(existing expiry, now) + period.
pub fn extend_promotion(
    current_expiry: Option<DateTime<Utc>>,
    period_days: i64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    current_expiry.map_or(now, |expires| expires.max(now)) + Duration::days(period_days.max(1))
}

/// What a client sees when it asks for a user's entitlement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntitlementView {
    pub user_id: Uuid,
    pub plan_tier: PlanTier,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub effective_tier: PlanTier,
    pub active: bool,
    pub promotion_expires_at: Option<DateTime<Utc>>,
    pub promotion_active: bool,
}

impl EntitlementView {
    pub fn from_entity(entity: &EntitlementEntity, now: DateTime<Utc>) -> Self {
        Self {
            user_id: entity.user_id,
            plan_tier: entity.stored_tier(),
            plan_expires_at: entity.plan_expires_at,
            effective_tier: entity.effective_tier(now),
            active: entity.is_active(now),
            promotion_expires_at: entity.promotion_expires_at,
            promotion_active: entity.promotion_active(now),
        }
    }

    pub fn free(user_id: Uuid) -> Self {
        Self {
            user_id,
            plan_tier: PlanTier::Free,
            plan_expires_at: None,
            effective_tier: PlanTier::Free,
            active: false,
            promotion_expires_at: None,
            promotion_active: false,
        }
    }
}

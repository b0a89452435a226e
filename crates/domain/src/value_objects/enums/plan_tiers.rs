use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Subscription tiers, totally ordered `Free < Advance < Elite`.
#[derive(
    Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Advance,
    Elite,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Advance => "advance",
            PlanTier::Elite => "elite",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "advance" => Some(PlanTier::Advance),
            "elite" => Some(PlanTier::Elite),
            _ => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        *self != PlanTier::Free
    }
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

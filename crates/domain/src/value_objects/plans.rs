use serde::{Deserialize, Serialize};

use crate::value_objects::enums::plan_tiers::PlanTier;

/// Validity applied when no catalog entry overrides it.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

/// A configured plan as the admin catalog describes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanCatalogEntry {
    pub name: String,
    pub validity_days: i64,
    pub price_minor: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub tier: PlanTier,
    pub validity_days: i64,
    pub catalog_name: Option<String>,
    pub price_minor: Option<i64>,
}

/// Highest tier whose name appears in the label; `Free` when none does.
pub fn tier_from_label(raw_label: &str) -> PlanTier {
    let label = raw_label.to_lowercase();
    [PlanTier::Elite, PlanTier::Advance]
        .into_iter()
        .find(|tier| label.contains(tier.as_str()))
        .unwrap_or(PlanTier::Free)
}

/// Catalog names shorter than this never match by containment.
const MIN_CONTAINED_NAME_LEN: usize = 3;

/// Exact (case and whitespace insensitive) matches win over containment matches.
/// A containment match needs the whole catalog name inside the label; among
/// those the longest name is the most specific one.
pub fn match_catalog_entry<'a>(
    raw_label: &str,
    catalog: &'a [PlanCatalogEntry],
) -> Option<&'a PlanCatalogEntry> {
    let label = normalize(raw_label);
    if label.is_empty() {
        return None;
    }

    if let Some(entry) = exact_catalog_entry(&label, catalog) {
        return Some(entry);
    }

    catalog
        .iter()
        .map(|entry| (normalize(&entry.name), entry))
        .filter(|(name, _)| name.chars().count() >= MIN_CONTAINED_NAME_LEN)
        .filter(|(name, _)| label.contains(name.as_str()))
        .max_by_key(|(name, _)| name.len())
        .map(|(_, entry)| entry)
}

/// Total: unresolvable labels degrade to `Free` with the default validity.
pub fn resolve_plan(
    raw_label: &str,
    catalog: &[PlanCatalogEntry],
    default_validity_days: i64,
) -> ResolvedPlan {
    from_catalog(
        tier_from_label(raw_label),
        match_catalog_entry(raw_label, catalog),
        default_validity_days,
    )
}

/// For a tier that is already known only a catalog entry named exactly after
/// it applies; anything else gets the default validity.
pub fn resolve_known_tier(
    tier: PlanTier,
    catalog: &[PlanCatalogEntry],
    default_validity_days: i64,
) -> ResolvedPlan {
    from_catalog(
        tier,
        exact_catalog_entry(tier.as_str(), catalog),
        default_validity_days,
    )
}

fn exact_catalog_entry<'a>(
    raw_name: &str,
    catalog: &'a [PlanCatalogEntry],
) -> Option<&'a PlanCatalogEntry> {
    let wanted = normalize(raw_name);
    catalog
        .iter()
        .find(|entry| !wanted.is_empty() && normalize(&entry.name) == wanted)
}

fn from_catalog(
    tier: PlanTier,
    entry: Option<&PlanCatalogEntry>,
    default_validity_days: i64,
) -> ResolvedPlan {
    let default_validity_days = if default_validity_days > 0 {
        default_validity_days
    } else {
        DEFAULT_VALIDITY_DAYS
    };

    match entry {
        Some(entry) => ResolvedPlan {
            tier,
            validity_days: if entry.validity_days > 0 {
                entry.validity_days
            } else {
                default_validity_days
            },
            catalog_name: Some(entry.name.clone()),
            price_minor: entry.price_minor.filter(|price| *price > 0),
        },
        None => ResolvedPlan {
            tier,
            validity_days: default_validity_days,
            catalog_name: None,
            price_minor: None,
        },
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, validity_days: i64) -> PlanCatalogEntry {
        PlanCatalogEntry {
            name: name.to_string(),
            validity_days,
            price_minor: Some(9_700),
        }
    }

    #[test]
    fn elite_wins_regardless_of_other_substrings() {
        for label in ["Elite Black", "ADVANCE to ELITE", "plano eLiTe advance", "elite"] {
            assert_eq!(tier_from_label(label), PlanTier::Elite, "{label}");
        }
    }

    #[test]
    fn advance_without_elite_resolves_advance() {
        for label in ["Advance", "Plano ADVANCE mensal", "advanced"] {
            assert_eq!(tier_from_label(label), PlanTier::Advance, "{label}");
        }
    }

    #[test]
    fn anything_else_is_free() {
        for label in ["", "Premium", "Elit", "Avançado", "   "] {
            assert_eq!(tier_from_label(label), PlanTier::Free, "{label:?}");
        }
    }

    #[test]
    fn defaults_to_thirty_days_without_catalog() {
        let resolved = resolve_plan("Elite Black", &[], DEFAULT_VALIDITY_DAYS);
        assert_eq!(resolved.tier, PlanTier::Elite);
        assert_eq!(resolved.validity_days, 30);
        assert_eq!(resolved.catalog_name, None);
    }

    #[test]
    fn exact_catalog_match_overrides_validity() {
        let catalog = vec![entry("Elite", 30), entry("Elite Black Anual", 365)];
        let resolved = resolve_plan("  elite   black anual ", &catalog, 30);
        assert_eq!(resolved.validity_days, 365);
        assert_eq!(resolved.catalog_name.as_deref(), Some("Elite Black Anual"));
        assert_eq!(resolved.price_minor, Some(9_700));
    }

    #[test]
    fn fuzzy_match_prefers_the_most_specific_name() {
        let catalog = vec![entry("Advance", 30), entry("Advance Trimestral", 90)];
        let resolved = resolve_plan("Plano Advance Trimestral - Pix", &catalog, 30);
        assert_eq!(resolved.tier, PlanTier::Advance);
        assert_eq!(resolved.validity_days, 90);
    }

    #[test]
    fn non_positive_catalog_validity_falls_back_to_default() {
        let catalog = vec![entry("Elite", 0)];
        let resolved = resolve_plan("Elite", &catalog, 30);
        assert_eq!(resolved.validity_days, 30);
    }

    #[test]
    fn non_positive_default_is_replaced() {
        let resolved = resolve_plan("whatever", &[], -5);
        assert_eq!(resolved.tier, PlanTier::Free);
        assert_eq!(resolved.validity_days, DEFAULT_VALIDITY_DAYS);
    }

    #[test]
    fn short_label_does_not_pick_a_catalog_entry() {
        let catalog = vec![entry("Elite Black Anual", 365), entry("Advance Mensal", 30)];
        assert_eq!(match_catalog_entry("E", &catalog), None);
        assert_eq!(match_catalog_entry("anual", &catalog), None);
    }

    #[test]
    fn label_contained_in_longer_names_gets_the_default() {
        let catalog = vec![entry("Advance Mensal", 30), entry("Advance Anual", 365)];
        let resolved = resolve_plan("Advance", &catalog, 30);
        assert_eq!(resolved.tier, PlanTier::Advance);
        assert_eq!(resolved.validity_days, 30);
        assert_eq!(resolved.catalog_name, None);
    }

    #[test]
    fn short_catalog_names_never_match_by_containment() {
        let catalog = vec![entry("E", 365)];
        let resolved = resolve_plan("Plano Elite", &catalog, 30);
        assert_eq!(resolved.validity_days, 30);
        assert_eq!(resolved.catalog_name, None);
    }

    #[test]
    fn known_tier_uses_only_an_exactly_named_entry() {
        let catalog = vec![entry("Advance Anual", 365), entry("Elite Black", 90)];
        let advance = resolve_known_tier(PlanTier::Advance, &catalog, 30);
        assert_eq!(advance.validity_days, 30);
        assert_eq!(advance.catalog_name, None);

        let catalog = vec![entry("Advance Anual", 365), entry(" ADVANCE ", 45)];
        let advance = resolve_known_tier(PlanTier::Advance, &catalog, 30);
        assert_eq!(advance.tier, PlanTier::Advance);
        assert_eq!(advance.validity_days, 45);
    }
}

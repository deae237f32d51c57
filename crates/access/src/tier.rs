//! Tier Registry: the ordered catalog of membership tiers.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use alliances_core::{DomainError, DomainResult, Entity};

use crate::AccessError;

/// Stable key of a membership tier (e.g. `GOLD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierKey(Cow<'static, str>);

impl TierKey {
    pub const BRONZE: TierKey = TierKey(Cow::Borrowed("BRONZE"));
    pub const SILVER: TierKey = TierKey(Cow::Borrowed("SILVER"));
    pub const GOLD: TierKey = TierKey(Cow::Borrowed("GOLD"));
    pub const PLATINUM: TierKey = TierKey(Cow::Borrowed("PLATINUM"));

    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TierKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ranked membership level. Higher rank means more privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub key: TierKey,
    pub label: String,
    pub rank: i32,
}

impl Tier {
    pub fn new(key: TierKey, label: impl Into<String>, rank: i32) -> Self {
        Self {
            key,
            label: label.into(),
            rank,
        }
    }

    /// "At least" comparison used by access rules.
    pub fn satisfies(&self, minimum: &Tier) -> bool {
        self.rank >= minimum.rank
    }
}

impl Entity for Tier {
    type Id = TierKey;

    fn id(&self) -> &TierKey {
        &self.key
    }
}

/// Tiers in ascending rank order, with unique keys and unique ranks.
///
/// Ranks need not be contiguous. After construction only labels may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierRegistry {
    tiers: Vec<Tier>,
}

impl TierRegistry {
    pub fn new(tiers: impl IntoIterator<Item = Tier>) -> DomainResult<Self> {
        let mut tiers: Vec<Tier> = tiers.into_iter().collect();

        let mut keys = HashSet::new();
        let mut ranks = HashSet::new();
        for tier in &tiers {
            if tier.key.as_str().trim().is_empty() {
                return Err(DomainError::validation("tier key must not be empty"));
            }
            if !keys.insert(tier.key.clone()) {
                return Err(DomainError::invariant(format!("duplicate tier key {}", tier.key)));
            }
            if !ranks.insert(tier.rank) {
                return Err(DomainError::invariant(format!(
                    "tier {} reuses rank {}",
                    tier.key, tier.rank
                )));
            }
        }

        tiers.sort_by_key(|t| t.rank);
        Ok(Self { tiers })
    }

    /// Bronze < Silver < Gold < Platinum partner tiers, ranked 1..=4.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                Tier::new(TierKey::BRONZE, "Bronze Partner", 1),
                Tier::new(TierKey::SILVER, "Silver Partner", 2),
                Tier::new(TierKey::GOLD, "Gold Partner", 3),
                Tier::new(TierKey::PLATINUM, "Platinum Partner", 4),
            ],
        }
    }

    pub fn get(&self, key: &TierKey) -> Result<&Tier, AccessError> {
        self.tiers
            .iter()
            .find(|t| &t.key == key)
            .ok_or_else(|| AccessError::TierNotFound(key.clone()))
    }

    pub fn contains(&self, key: &TierKey) -> bool {
        self.tiers.iter().any(|t| &t.key == key)
    }

    pub fn ordered_by_rank(&self) -> &[Tier] {
        &self.tiers
    }

    /// Add a tier created after the initial catalog.
    pub fn insert(&mut self, tier: Tier) -> DomainResult<()> {
        let mut all = self.tiers.clone();
        all.push(tier);
        *self = Self::new(all)?;
        Ok(())
    }

    pub fn relabel(&mut self, key: &TierKey, label: impl Into<String>) -> Result<(), AccessError> {
        let tier = self
            .tiers
            .iter_mut()
            .find(|t| &t.key == key)
            .ok_or_else(|| AccessError::TierNotFound(key.clone()))?;
        tier.label = label.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_tiers_by_rank_regardless_of_input_order() {
        let registry = TierRegistry::new(vec![
            Tier::new(TierKey::GOLD, "Gold", 30),
            Tier::new(TierKey::BRONZE, "Bronze", 1),
            Tier::new(TierKey::SILVER, "Silver", 7),
        ])
        .unwrap();

        let keys: Vec<&str> = registry.ordered_by_rank().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["BRONZE", "SILVER", "GOLD"]);
    }

    #[test]
    fn rejects_duplicate_ranks_and_keys() {
        let dup_rank = TierRegistry::new(vec![
            Tier::new(TierKey::BRONZE, "Bronze", 1),
            Tier::new(TierKey::SILVER, "Silver", 1),
        ]);
        assert!(matches!(dup_rank, Err(DomainError::InvariantViolation(_))));

        let dup_key = TierRegistry::new(vec![
            Tier::new(TierKey::BRONZE, "Bronze", 1),
            Tier::new(TierKey::BRONZE, "Bronze again", 2),
        ]);
        assert!(matches!(dup_key, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn rejects_blank_keys() {
        let result = TierRegistry::new(vec![Tier::new(TierKey::new("  "), "Blank", 1)]);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn unknown_key_is_tier_not_found() {
        let registry = TierRegistry::standard();
        let missing = TierKey::new("DIAMOND");
        assert_eq!(registry.get(&missing), Err(AccessError::TierNotFound(missing)));
    }

    #[test]
    fn relabel_keeps_rank() {
        let mut registry = TierRegistry::standard();
        registry.relabel(&TierKey::GOLD, "Gold Member").unwrap();
        let gold = registry.get(&TierKey::GOLD).unwrap();
        assert_eq!(gold.label, "Gold Member");
        assert_eq!(gold.rank, 3);
    }

    #[test]
    fn insert_keeps_order_and_uniqueness() {
        let mut registry = TierRegistry::standard();
        registry.insert(Tier::new(TierKey::new("COPPER"), "Copper", 0)).unwrap();
        assert_eq!(registry.ordered_by_rank()[0].key.as_str(), "COPPER");

        let clash = registry.insert(Tier::new(TierKey::new("STEEL"), "Steel", 2));
        assert!(clash.is_err());
        assert_eq!(registry.ordered_by_rank().len(), 5);
    }
}

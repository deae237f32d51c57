//! Gated applications and their access rules.

use std::borrow::Cow;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use alliances_core::{DomainError, Entity};

use crate::Tier;

/// Stable key of a gated sub-application (e.g. `TALENT_DISCOVERY`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppKey(Cow<'static, str>);

impl AppKey {
    pub const MEMBERSHIP_DASHBOARD: AppKey = AppKey(Cow::Borrowed("MEMBERSHIP_DASHBOARD"));
    pub const IXN_WORKFLOW_MANAGER: AppKey = AppKey(Cow::Borrowed("IXN_WORKFLOW_MANAGER"));
    pub const TALENT_DISCOVERY: AppKey = AppKey(Cow::Borrowed("TALENT_DISCOVERY"));

    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AppKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub key: AppKey,
    pub name: String,
    pub base_path: String,
    pub description: Option<String>,
}

impl Application {
    pub fn new(key: AppKey, name: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            base_path: base_path.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Entity for Application {
    type Id = AppKey;

    fn id(&self) -> &AppKey {
        &self.key
    }
}

/// What a matching rule does to the verdict.
///
/// Only `Allow` is used by the shipped catalog. `Deny` overrides any allow
/// when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessEffect {
    Allow,
    Deny,
}

impl AccessEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessEffect::Allow => "ALLOW",
            AccessEffect::Deny => "DENY",
        }
    }
}

impl core::fmt::Display for AccessEffect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessEffect {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLOW" => Ok(AccessEffect::Allow),
            "DENY" => Ok(AccessEffect::Deny),
            other => Err(DomainError::validation(format!("unknown access effect '{other}'"))),
        }
    }
}

/// A per-application rule naming the minimum tier it applies from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub app: AppKey,
    pub minimum_tier: Tier,
    pub effect: AccessEffect,
}

impl AccessRule {
    pub fn allow(app: AppKey, minimum_tier: Tier) -> Self {
        Self {
            app,
            minimum_tier,
            effect: AccessEffect::Allow,
        }
    }

    pub fn deny(app: AppKey, minimum_tier: Tier) -> Self {
        Self {
            app,
            minimum_tier,
            effect: AccessEffect::Deny,
        }
    }

    /// A rule matches every tier ranked at or above its minimum.
    pub fn matches(&self, tier: &Tier) -> bool {
        tier.satisfies(&self.minimum_tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TierKey, TierRegistry};

    #[test]
    fn effect_wire_form_is_upper_case() {
        assert_eq!(serde_json::to_string(&AccessEffect::Allow).unwrap(), "\"ALLOW\"");
        assert_eq!("DENY".parse::<AccessEffect>().unwrap(), AccessEffect::Deny);
        assert!("allow".parse::<AccessEffect>().is_err());
    }

    #[test]
    fn rule_matches_at_and_above_minimum() {
        let tiers = TierRegistry::standard();
        let rule = AccessRule::allow(
            AppKey::IXN_WORKFLOW_MANAGER,
            tiers.get(&TierKey::SILVER).unwrap().clone(),
        );

        assert!(!rule.matches(tiers.get(&TierKey::BRONZE).unwrap()));
        assert!(rule.matches(tiers.get(&TierKey::SILVER).unwrap()));
        assert!(rule.matches(tiers.get(&TierKey::PLATINUM).unwrap()));
    }
}

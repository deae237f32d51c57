//! Memberships and the highest-active-tier resolver.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use alliances_core::{DomainError, Entity, MembershipId, OrganisationId, UserId};

use crate::{Tier, TierKey};

/// Lifecycle status recorded on a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Active,
    Inactive,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
        }
    }
}

impl core::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(MembershipStatus::Active),
            "inactive" => Ok(MembershipStatus::Inactive),
            other => Err(DomainError::validation(format!("unknown membership status '{other}'"))),
        }
    }
}

/// A user's association with an organisation at a given tier.
///
/// `is_active` is the flag access checks look at; `status` is the lifecycle
/// label shown to people. Nothing stops a user from holding several active
/// memberships at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub organisation_id: OrganisationId,
    pub tier: TierKey,
    pub is_active: bool,
    pub status: MembershipStatus,
    pub expiry: Option<DateTime<Utc>>,
    pub manager_name: Option<String>,
}

impl Membership {
    /// An active membership with no expiry and no manager.
    pub fn active(user_id: UserId, organisation_id: OrganisationId, tier: TierKey) -> Self {
        Self {
            id: MembershipId::new(),
            user_id,
            organisation_id,
            tier,
            is_active: true,
            status: MembershipStatus::Active,
            expiry: None,
            manager_name: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now)
    }

    /// Whether this membership counts as active under `policy` at `now`.
    pub fn counts_as_active(&self, policy: ExpiryPolicy, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match policy {
            ExpiryPolicy::Ignore => true,
            ExpiryPolicy::Enforce => !self.is_expired_at(now),
        }
    }
}

impl Entity for Membership {
    type Id = MembershipId;

    fn id(&self) -> &MembershipId {
        &self.id
    }
}

/// Whether a past `expiry` removes a membership from consideration.
///
/// `Ignore` keeps the long-standing behaviour where only `is_active` matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    #[default]
    Ignore,
    Enforce,
}

/// A membership joined with its tier as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMembership {
    pub membership: Membership,
    pub tier: Tier,
}

/// Pick the membership with the highest-ranked tier among those that count as active.
///
/// Ties on rank keep the first one encountered, so callers that surface the
/// tier label get the earliest membership in storage order.
pub fn resolve_highest_active(
    memberships: &[ResolvedMembership],
    policy: ExpiryPolicy,
    now: DateTime<Utc>,
) -> Option<&ResolvedMembership> {
    let mut best: Option<&ResolvedMembership> = None;
    for current in memberships
        .iter()
        .filter(|m| m.membership.counts_as_active(policy, now))
    {
        if best.is_none_or(|b| current.tier.rank > b.tier.rank) {
            best = Some(current);
        }
    }
    best
}

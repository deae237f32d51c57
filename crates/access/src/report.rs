//! Per-tier member counts for the administrative dashboard.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use alliances_core::UserId;

use crate::{ExpiryPolicy, Membership, Role, Tier, TierKey};

/// Everything the report needs, read from storage as one consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    /// All tiers, ascending by rank.
    pub tiers: Vec<Tier>,
    pub memberships: Vec<Membership>,
    /// Users holding the role the report counts.
    pub role_holders: HashSet<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierMemberCount {
    pub tier: Tier,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierReport {
    pub role: Role,
    /// One entry per tier, ascending by rank, zero counts included.
    pub tiers: Vec<TierMemberCount>,
    pub total: u64,
}

/// Count active memberships held by `role` holders, per tier.
///
/// Each membership is counted at most once. Memberships referencing a tier
/// missing from the snapshot are not counted anywhere.
pub fn tier_member_counts(
    snapshot: &ReportSnapshot,
    role: &Role,
    policy: ExpiryPolicy,
    now: DateTime<Utc>,
) -> TierReport {
    let mut per_tier: HashMap<&TierKey, u64> = HashMap::new();
    for membership in &snapshot.memberships {
        if membership.counts_as_active(policy, now)
            && snapshot.role_holders.contains(&membership.user_id)
        {
            *per_tier.entry(&membership.tier).or_default() += 1;
        }
    }

    let mut tiers: Vec<TierMemberCount> = snapshot
        .tiers
        .iter()
        .map(|tier| TierMemberCount {
            tier: tier.clone(),
            count: per_tier.get(&tier.key).copied().unwrap_or(0),
        })
        .collect();
    tiers.sort_by_key(|c| c.tier.rank);

    let total = tiers.iter().map(|c| c.count).sum();

    TierReport {
        role: role.clone(),
        tiers,
        total,
    }
}

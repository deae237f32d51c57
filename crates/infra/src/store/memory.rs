//! In-memory portal store for tests and local development.
//!
//! State lives behind one `tokio::sync::RwLock`, so every read (including a
//! whole report snapshot) observes a single consistent version of the data.
//! Nothing is durable.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use alliances_access::{
    AccessEffect, AccessRule, AppKey, Application, Membership, MembershipStatus, Organisation,
    ReportSnapshot, ResolvedMembership, Role, Tier, TierKey, TierRegistry, User,
};
use alliances_core::{Entity, MembershipId, OrganisationId, UserId};

use super::{PortalStore, StoreError, StoreResult};

/// Stored form of a rule: the tier is joined at read time.
#[derive(Debug, Clone)]
struct RuleRecord {
    app: AppKey,
    minimum_tier: TierKey,
    effect: AccessEffect,
}

#[derive(Debug, Default)]
struct PortalState {
    tiers: TierRegistry,
    organisations: HashMap<OrganisationId, Organisation>,
    users: HashMap<UserId, User>,
    /// Creation order is significant (tie-break for equal ranks).
    memberships: Vec<Membership>,
    applications: BTreeMap<AppKey, Application>,
    rules: Vec<RuleRecord>,
}

impl PortalState {
    fn require_tier(&self, key: &TierKey) -> StoreResult<()> {
        if self.tiers.contains(key) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("membership tier {key}")))
        }
    }

    fn membership_mut(&mut self, id: MembershipId) -> StoreResult<&mut Membership> {
        self.memberships
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("membership {id}")))
    }

    fn resolve(&self, membership: &Membership) -> Option<ResolvedMembership> {
        let tier = self.tiers.get(&membership.tier).ok()?;
        Some(ResolvedMembership {
            membership: membership.clone(),
            tier: tier.clone(),
        })
    }
}

fn upsert_in_order<E: Entity>(items: &mut Vec<E>, item: E) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPortalStore {
    inner: RwLock<PortalState>,
}

impl InMemoryPortalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiers(tiers: TierRegistry) -> Self {
        Self {
            inner: RwLock::new(PortalState {
                tiers,
                ..PortalState::default()
            }),
        }
    }

    pub async fn insert_tier(&self, tier: Tier) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state
            .tiers
            .insert(tier)
            .map_err(|e| StoreError::Conflict(e.to_string()))
    }

    /// Labels are the only mutable part of a tier.
    pub async fn relabel_tier(&self, key: &TierKey, label: impl Into<String>) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state
            .tiers
            .relabel(key, label)
            .map_err(|e| StoreError::NotFound(e.to_string()))
    }

    pub async fn upsert_organisation(&self, organisation: Organisation) {
        let mut state = self.inner.write().await;
        state.organisations.insert(*organisation.id(), organisation);
    }

    pub async fn upsert_user(&self, user: User) {
        let mut state = self.inner.write().await;
        state.users.insert(*user.id(), user);
    }

    pub async fn grant_role(&self, user_id: UserId, role: Role) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        if !user.has_role(&role) {
            user.roles.push(role);
        }
        Ok(())
    }

    pub async fn revoke_role(&self, user_id: UserId, role: &Role) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        user.roles.retain(|r| r != role);
        Ok(())
    }

    /// Insert or replace a membership. Its tier must already exist.
    pub async fn upsert_membership(&self, membership: Membership) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.require_tier(&membership.tier)?;
        upsert_in_order(&mut state.memberships, membership);
        Ok(())
    }

    pub async fn set_membership_tier(&self, id: MembershipId, tier: TierKey) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.require_tier(&tier)?;
        state.membership_mut(id)?.tier = tier;
        Ok(())
    }

    /// Flip the active flag; the lifecycle status follows it.
    pub async fn set_membership_active(&self, id: MembershipId, is_active: bool) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        let membership = state.membership_mut(id)?;
        membership.is_active = is_active;
        membership.status = if is_active {
            MembershipStatus::Active
        } else {
            MembershipStatus::Inactive
        };
        Ok(())
    }

    pub async fn insert_application(&self, application: Application) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        if state.applications.contains_key(application.id()) {
            return Err(StoreError::Conflict(format!("application {}", application.key)));
        }
        state.applications.insert(application.key.clone(), application);
        Ok(())
    }

    pub async fn add_rule(
        &self,
        app: &AppKey,
        minimum_tier: &TierKey,
        effect: AccessEffect,
    ) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        if !state.applications.contains_key(app) {
            return Err(StoreError::NotFound(format!("application {app}")));
        }
        state.require_tier(minimum_tier)?;
        state.rules.push(RuleRecord {
            app: app.clone(),
            minimum_tier: minimum_tier.clone(),
            effect,
        });
        Ok(())
    }

    pub async fn clear_rules(&self, app: &AppKey) {
        let mut state = self.inner.write().await;
        state.rules.retain(|r| &r.app != app);
    }
}

#[async_trait]
impl PortalStore for InMemoryPortalStore {
    async fn tier_by_key(&self, key: &TierKey) -> StoreResult<Option<Tier>> {
        let state = self.inner.read().await;
        Ok(state.tiers.get(key).ok().cloned())
    }

    async fn tiers_by_rank(&self) -> StoreResult<Vec<Tier>> {
        let state = self.inner.read().await;
        Ok(state.tiers.ordered_by_rank().to_vec())
    }

    async fn user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let state = self.inner.read().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn organisation(&self, id: OrganisationId) -> StoreResult<Option<Organisation>> {
        let state = self.inner.read().await;
        Ok(state.organisations.get(&id).cloned())
    }

    async fn active_memberships(&self, user_id: UserId) -> StoreResult<Vec<ResolvedMembership>> {
        let state = self.inner.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.is_active)
            .filter_map(|m| state.resolve(m))
            .collect())
    }

    async fn application(&self, key: &AppKey) -> StoreResult<Option<Application>> {
        let state = self.inner.read().await;
        Ok(state.applications.get(key).cloned())
    }

    async fn applications(&self) -> StoreResult<Vec<Application>> {
        let state = self.inner.read().await;
        Ok(state.applications.values().cloned().collect())
    }

    async fn rules_for_app(&self, key: &AppKey) -> StoreResult<Vec<AccessRule>> {
        let state = self.inner.read().await;
        if !state.applications.contains_key(key) {
            return Err(StoreError::NotFound(format!("application {key}")));
        }

        Ok(state
            .rules
            .iter()
            .filter(|r| &r.app == key)
            .filter_map(|r| {
                let tier = state.tiers.get(&r.minimum_tier).ok()?;
                Some(AccessRule {
                    app: r.app.clone(),
                    minimum_tier: tier.clone(),
                    effect: r.effect,
                })
            })
            .collect())
    }

    async fn report_snapshot(&self, role: &Role) -> StoreResult<ReportSnapshot> {
        let state = self.inner.read().await;
        Ok(ReportSnapshot {
            tiers: state.tiers.ordered_by_rank().to_vec(),
            memberships: state
                .memberships
                .iter()
                .filter(|m| m.is_active)
                .cloned()
                .collect(),
            role_holders: state
                .users
                .values()
                .filter(|u| u.has_role(role))
                .map(|u| u.id)
                .collect(),
        })
    }
}

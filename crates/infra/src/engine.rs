//! Access engine: reads storage and applies the pure access model.
//!
//! Every call re-reads the store, so rule and membership changes apply on the
//! very next check. Nothing is cached and nothing is retried; storage errors
//! surface as `AccessError::StorageUnavailable` and never as a grant.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use alliances_access::{
    AccessDecision, AccessError, AccessExplanation, AccessRule, AppKey, Application,
    ExpiryPolicy, Identity, MembershipStatus, Role, Tier, TierKey, TierReport, evaluate, explain,
    resolve_highest_active, tier_member_counts,
};
use alliances_core::UserId;

use crate::store::{PortalStore, StoreError};

/// One application and whether the caller may enter it.
#[derive(Debug, Clone, Serialize)]
pub struct AppAccess {
    pub app: Application,
    pub granted: bool,
}

/// What the member dashboard shows for the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub first_name: String,
    pub organisation_name: Option<String>,
    /// Label of the highest active tier; equal ranks resolve to the earliest membership.
    pub tier_label: Option<String>,
    pub membership_status: Option<MembershipStatus>,
    pub expiry: Option<DateTime<Utc>>,
    pub manager_name: Option<String>,
    pub redeemed_benefit_codes: Vec<String>,
}

pub struct AccessEngine<S> {
    store: S,
    expiry: ExpiryPolicy,
}

impl<S> AccessEngine<S>
where
    S: PortalStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            expiry: ExpiryPolicy::default(),
        }
    }

    pub fn with_expiry_policy(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One tier by key; unknown keys are `TierNotFound`.
    #[instrument(skip_all, fields(tier = %key), err)]
    pub async fn tier_by_key(&self, key: &TierKey) -> Result<Tier, AccessError> {
        self.store
            .tier_by_key(key)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| AccessError::TierNotFound(key.clone()))
    }

    /// Every tier, ascending by rank.
    #[instrument(skip_all, err)]
    pub async fn tiers_by_rank(&self) -> Result<Vec<Tier>, AccessError> {
        self.store.tiers_by_rank().await.map_err(storage_failure)
    }

    /// The user's highest-ranked active tier; `None` for unknown users or
    /// users without an active membership.
    #[instrument(skip_all, fields(user_id = %user_id), err)]
    pub async fn resolve_highest_active_tier(&self, user_id: UserId) -> Result<Option<Tier>, AccessError> {
        let memberships = self
            .store
            .active_memberships(user_id)
            .await
            .map_err(storage_failure)?;

        Ok(resolve_highest_active(&memberships, self.expiry, Utc::now()).map(|m| m.tier.clone()))
    }

    /// Rules of an application; unknown keys are `AppNotFound`.
    #[instrument(skip_all, fields(app = %app), err)]
    pub async fn rules_for_app(&self, app: &AppKey) -> Result<Vec<AccessRule>, AccessError> {
        self.store.rules_for_app(app).await.map_err(|e| match e {
            StoreError::NotFound(_) => AccessError::AppNotFound(app.clone()),
            other => storage_failure(other),
        })
    }

    /// Whether the caller may enter `app`.
    pub async fn can_access(&self, identity: &Identity, app: &AppKey) -> Result<bool, AccessError> {
        let (_, _, decision) = self.decide(identity, app).await?;
        Ok(decision.granted)
    }

    /// The same decision as `can_access`, with its reasoning.
    pub async fn explain_access(
        &self,
        identity: &Identity,
        app: &AppKey,
    ) -> Result<AccessExplanation, AccessError> {
        let (tier, rules, _) = self.decide(identity, app).await?;
        Ok(explain(app, tier.as_ref(), &rules))
    }

    /// Every registered application with the caller's verdict, ordered by key.
    #[instrument(skip_all, fields(user_id = %identity.user_id), err)]
    pub async fn accessible_apps(&self, identity: &Identity) -> Result<Vec<AppAccess>, AccessError> {
        let (tier, apps) = tokio::try_join!(
            self.resolve_highest_active_tier(identity.user_id),
            async { self.store.applications().await.map_err(storage_failure) },
        )?;

        let mut out = Vec::with_capacity(apps.len());
        for app in apps {
            let rules = self.rules_for_app(&app.key).await?;
            let granted = evaluate(tier.as_ref(), &rules).granted;
            out.push(AppAccess { app, granted });
        }
        Ok(out)
    }

    /// Per-tier counts of active memberships held by `role` holders.
    #[instrument(skip_all, fields(role = %role), err)]
    pub async fn tier_member_counts(&self, role: &Role) -> Result<TierReport, AccessError> {
        let snapshot = self
            .store
            .report_snapshot(role)
            .await
            .map_err(storage_failure)?;

        let report = tier_member_counts(&snapshot, role, self.expiry, Utc::now());
        debug!(total = report.total, tiers = report.tiers.len(), "tier report built");
        Ok(report)
    }

    /// Dashboard data for the caller; `None` when no user record exists.
    #[instrument(skip_all, fields(user_id = %identity.user_id), err)]
    pub async fn member_summary(&self, identity: &Identity) -> Result<Option<MemberSummary>, AccessError> {
        let (user, memberships) = tokio::try_join!(
            async { self.store.user(identity.user_id).await.map_err(storage_failure) },
            async {
                self.store
                    .active_memberships(identity.user_id)
                    .await
                    .map_err(storage_failure)
            },
        )?;

        let Some(user) = user else {
            return Ok(None);
        };

        let organisation_name = match user.organisation_id {
            Some(id) => self
                .store
                .organisation(id)
                .await
                .map_err(storage_failure)?
                .map(|o| o.name),
            None => None,
        };

        let highest = resolve_highest_active(&memberships, self.expiry, Utc::now());

        Ok(Some(MemberSummary {
            first_name: user.first_name,
            organisation_name,
            tier_label: highest.map(|m| m.tier.label.clone()),
            membership_status: highest.map(|m| m.membership.status),
            expiry: highest.and_then(|m| m.membership.expiry),
            manager_name: highest.and_then(|m| m.membership.manager_name.clone()),
            redeemed_benefit_codes: user.redeemed_benefit_codes,
        }))
    }

    /// Load the caller's tier and the app's rules together, then evaluate.
    ///
    /// The application is always looked up, so an unknown key is reported
    /// even when the caller has no membership.
    #[instrument(skip_all, fields(user_id = %identity.user_id, app = %app), err)]
    async fn decide(
        &self,
        identity: &Identity,
        app: &AppKey,
    ) -> Result<(Option<Tier>, Vec<AccessRule>, AccessDecision), AccessError> {
        let (tier, rules) = tokio::try_join!(
            self.resolve_highest_active_tier(identity.user_id),
            self.rules_for_app(app),
        )?;

        let decision = evaluate(tier.as_ref(), &rules);
        debug!(granted = decision.granted, reason = ?decision.reason, "access decision");
        Ok((tier, rules, decision))
    }
}

fn storage_failure(err: StoreError) -> AccessError {
    warn!(error = %err, "portal store read failed");
    err.into()
}

//! Storage abstraction for portal reference data and memberships.
//!
//! The access engine holds no state of its own: every check goes through a
//! `PortalStore` and sees whatever the store returns at that moment.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use alliances_access::{
    AccessError, AccessRule, AppKey, Application, Organisation, ReportSnapshot, ResolvedMembership,
    Role, Tier, TierKey, User,
};
use alliances_core::{OrganisationId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPortalStore;
pub use postgres::PostgresPortalStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached or the read did not complete.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into the access model.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRecord(msg) => AccessError::InvalidRecord(msg),
            other => AccessError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Read side of the portal data the access engine depends on.
///
/// Implementations must not cache across calls. `report_snapshot` must read
/// tiers, memberships and role holders as one consistent snapshot.
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn tier_by_key(&self, key: &TierKey) -> StoreResult<Option<Tier>>;

    /// All tiers, ascending by rank.
    async fn tiers_by_rank(&self) -> StoreResult<Vec<Tier>>;

    async fn user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    async fn organisation(&self, id: OrganisationId) -> StoreResult<Option<Organisation>>;

    /// The user's memberships with `is_active == true`, joined with their
    /// tiers, in creation order. Unknown users have none.
    async fn active_memberships(&self, user_id: UserId) -> StoreResult<Vec<ResolvedMembership>>;

    async fn application(&self, key: &AppKey) -> StoreResult<Option<Application>>;

    /// All registered applications, ordered by key.
    async fn applications(&self) -> StoreResult<Vec<Application>>;

    /// Rules of one application (possibly empty).
    ///
    /// Fails with `StoreError::NotFound` when the application does not exist.
    async fn rules_for_app(&self, key: &AppKey) -> StoreResult<Vec<AccessRule>>;

    async fn report_snapshot(&self, role: &Role) -> StoreResult<ReportSnapshot>;
}

#[async_trait]
impl<S> PortalStore for Arc<S>
where
    S: PortalStore + ?Sized,
{
    async fn tier_by_key(&self, key: &TierKey) -> StoreResult<Option<Tier>> {
        (**self).tier_by_key(key).await
    }

    async fn tiers_by_rank(&self) -> StoreResult<Vec<Tier>> {
        (**self).tiers_by_rank().await
    }

    async fn user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).user(user_id).await
    }

    async fn organisation(&self, id: OrganisationId) -> StoreResult<Option<Organisation>> {
        (**self).organisation(id).await
    }

    async fn active_memberships(&self, user_id: UserId) -> StoreResult<Vec<ResolvedMembership>> {
        (**self).active_memberships(user_id).await
    }

    async fn application(&self, key: &AppKey) -> StoreResult<Option<Application>> {
        (**self).application(key).await
    }

    async fn applications(&self) -> StoreResult<Vec<Application>> {
        (**self).applications().await
    }

    async fn rules_for_app(&self, key: &AppKey) -> StoreResult<Vec<AccessRule>> {
        (**self).rules_for_app(key).await
    }

    async fn report_snapshot(&self, role: &Role) -> StoreResult<ReportSnapshot> {
        (**self).report_snapshot(role).await
    }
}

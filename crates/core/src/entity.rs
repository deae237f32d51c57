//! Entity trait: records that keep their identity while their attributes change.

/// A record addressed by a stable identifier (tiers by key, memberships by id, ...).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

//! Infrastructure layer: portal storage and the access engine that reads it.

pub mod engine;
pub mod seed;
pub mod store;

pub use engine::{AccessEngine, AppAccess, MemberSummary};
pub use store::{InMemoryPortalStore, PortalStore, PostgresPortalStore, StoreError, StoreResult};

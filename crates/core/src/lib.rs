//! `alliances-core`: identifiers and error primitives shared by the portal crates.
//!
//! Nothing in here performs IO.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{MembershipId, OrganisationId, UserId};

//! `alliances-access`: the tiered access-control model.
//!
//! Tier ranking, membership resolution, per-application rules, the allow/deny
//! decision and the per-tier reporting aggregate. This crate performs no IO:
//! storage lives in `alliances-infra`, transport in `alliances-api`.

pub mod application;
pub mod claims;
pub mod decision;
pub mod error;
pub mod identity;
pub mod membership;
pub mod report;
pub mod roles;
pub mod tier;
pub mod user;

pub use application::{AccessEffect, AccessRule, AppKey, Application};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use decision::{
    AccessDecision, AccessExplanation, DecisionReason, DenialKind, DenialReason, RuleOutcome,
    evaluate, explain,
};
pub use error::AccessError;
pub use identity::Identity;
pub use membership::{
    ExpiryPolicy, Membership, MembershipStatus, ResolvedMembership, resolve_highest_active,
};
pub use report::{ReportSnapshot, TierMemberCount, TierReport, tier_member_counts};
pub use roles::Role;
pub use tier::{Tier, TierKey, TierRegistry};
pub use user::{Organisation, OrganisationKind, User};

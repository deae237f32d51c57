use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Portal role key (e.g. `ADMIN`, `MEMBER`).
///
/// Roles are a facet of the user record, independent of membership tiers.
/// Tiers gate applications; roles gate administrative views and decide who
/// is counted in the tier report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));
    pub const MEMBER: Role = Role(Cow::Borrowed("MEMBER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

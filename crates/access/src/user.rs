//! Portal users and their organisations.

use serde::{Deserialize, Serialize};

use alliances_core::{Entity, OrganisationId, UserId};

use crate::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganisationKind {
    #[default]
    Industry,
    Academic,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub slug: String,
    pub name: String,
    pub kind: OrganisationKind,
}

impl Entity for Organisation {
    type Id = OrganisationId;

    fn id(&self) -> &OrganisationId {
        &self.id
    }
}

/// A portal account.
///
/// `password_hash` is opaque here; credential checks belong to sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub organisation_id: Option<OrganisationId>,
    pub roles: Vec<Role>,
    pub redeemed_benefit_codes: Vec<String>,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            organisation_id: None,
            roles: Vec::new(),
            redeemed_benefit_codes: Vec::new(),
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

use serde::{Deserialize, Serialize};

use alliances_core::UserId;

use crate::Role;

/// The caller of an access check: current user id plus current role set.
///
/// Built at the transport boundary (from a verified session) and passed
/// explicitly into every check; nothing reads ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_checks_are_exact_matches() {
        let identity = Identity::new(UserId::new(), vec![Role::MEMBER]);
        assert!(identity.has_role(&Role::MEMBER));
        assert!(!identity.is_admin());
        assert!(!identity.has_role(&Role::new("member")));
    }
}

use chrono::{DateTime, Utc};

use alliances_access::{Identity, SessionClaims};

/// Verified session for a request.
///
/// Inserted by the auth middleware; every authenticated route reads the
/// caller from here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn from_claims(claims: SessionClaims) -> Self {
        let expires_at = claims.expires_at;
        Self {
            identity: claims.into_identity(),
            expires_at,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

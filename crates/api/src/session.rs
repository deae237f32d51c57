//! Bearer session verification.
//!
//! Tokens are HS256 JWTs whose payload is `SessionClaims`. The signature is
//! checked here; the validity window is checked by `validate_claims`, since
//! the claims carry RFC 3339 timestamps rather than numeric `exp`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use alliances_access::{SessionClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed or unsigned session token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Window(#[from] TokenValidationError),
}

pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError>;
}

pub struct Hs256SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256SessionVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionVerifier for Hs256SessionVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let claims = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)?.claims;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use alliances_access::Role;
    use alliances_core::UserId;

    use super::*;

    fn sign(secret: &[u8], claims: &SessionClaims) -> String {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> SessionClaims {
        SessionClaims {
            sub: UserId::new(),
            roles: vec![Role::MEMBER],
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn valid_token_yields_claims() {
        let now = Utc::now();
        let expected = claims(now, Duration::minutes(10));
        let verifier = Hs256SessionVerifier::new(b"secret");

        let got = verifier.verify(&sign(b"secret", &expected), now).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = sign(b"other", &claims(now, Duration::minutes(10)));
        let err = Hs256SessionVerifier::new(b"secret").verify(&token, now).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
    }

    #[test]
    fn expired_session_is_rejected() {
        let issued = Utc::now() - Duration::hours(2);
        let token = sign(b"secret", &claims(issued, Duration::minutes(10)));
        let err = Hs256SessionVerifier::new(b"secret")
            .verify(&token, Utc::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Window(TokenValidationError::Expired)));
    }
}

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::warn;

use alliances_access::ExpiryPolicy;

const DEV_SESSION_SECRET: &str = "dev-session-secret";

// API configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    /// Postgres connection string; the seeded in-memory store is used without it.
    pub database_url: Option<String>,
    pub expiry_policy: ExpiryPolicy,
    pub seed_demo: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("PORTAL_BIND")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse PORTAL_BIND")?;

        let session_secret = lookup("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set; using insecure dev default");
            DEV_SESSION_SECRET.to_string()
        });

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let enforce_expiry = parse_flag(&lookup, "PORTAL_ENFORCE_MEMBERSHIP_EXPIRY", false)?;
        let expiry_policy = if enforce_expiry {
            ExpiryPolicy::Enforce
        } else {
            ExpiryPolicy::Ignore
        };

        let seed_demo = parse_flag(&lookup, "PORTAL_SEED_DEMO", true)?;

        Ok(Self {
            bind_addr,
            session_secret,
            database_url,
            expiry_policy,
            seed_demo,
        })
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .parse()
            .with_context(|| format!("parse {key} (expected true or false)")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.session_secret, DEV_SESSION_SECRET);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.expiry_policy, ExpiryPolicy::Ignore);
        assert!(cfg.seed_demo);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            ("PORTAL_BIND", "127.0.0.1:9000"),
            ("SESSION_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/portal"),
            ("PORTAL_ENFORCE_MEMBERSHIP_EXPIRY", "TRUE"),
            ("PORTAL_SEED_DEMO", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.session_secret, "s3cret");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/portal"));
        assert_eq!(cfg.expiry_policy, ExpiryPolicy::Enforce);
        assert!(!cfg.seed_demo);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config(&[("PORTAL_BIND", "not-an-addr")]).is_err());
        assert!(config(&[("PORTAL_SEED_DEMO", "maybe")]).is_err());
    }
}

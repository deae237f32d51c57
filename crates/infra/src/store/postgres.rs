//! Postgres-backed portal store (read-only).
//!
//! Expected tables:
//!
//! | table | columns |
//! |-------|---------|
//! | `membership_tiers` | `key text pk`, `label text`, `rank int4 unique` |
//! | `organisations` | `id uuid pk`, `slug text`, `name text`, `kind text` |
//! | `users` | `id uuid pk`, `email text`, `password_hash text`, `first_name text`, `last_name text`, `organisation_id uuid null`, `redeemed_benefit_codes text[]` |
//! | `user_roles` | `user_id uuid`, `role_key text` |
//! | `memberships` | `id uuid pk`, `user_id uuid`, `organisation_id uuid`, `tier_key text`, `is_active bool`, `status text`, `expiry timestamptz null`, `manager_name text null`, `created_at timestamptz` |
//! | `apps` | `key text pk`, `name text`, `base_path text`, `description text null` |
//! | `app_access_rules` | `app_key text`, `min_tier_key text null`, `access_type text` |
//!
//! Schema management and writes belong to other tooling.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | pool timeout / closed, IO, TLS, protocol | `Unavailable` |
//! | database error (query failed) | `Unavailable` |
//! | decode / missing column / unknown type | `InvalidRecord` |
//! | row not found | `NotFound` |

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use alliances_access::{
    AccessEffect, AccessRule, AppKey, Application, Membership, MembershipStatus, Organisation,
    OrganisationKind, ReportSnapshot, ResolvedMembership, Role, Tier, TierKey, User,
};
use alliances_core::{MembershipId, OrganisationId, UserId};

use super::{PortalStore, StoreError, StoreResult};

/// Postgres-backed portal store.
///
/// `Send + Sync`; the SQLx pool handles connection sharing. Every method
/// issues fresh queries. The report snapshot runs inside a single
/// `REPEATABLE READ, READ ONLY` transaction.
#[derive(Debug, Clone)]
pub struct PostgresPortalStore {
    pool: Arc<PgPool>,
}

impl PostgresPortalStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PortalStore for PostgresPortalStore {
    #[instrument(skip(self), fields(tier = %key), err)]
    async fn tier_by_key(&self, key: &TierKey) -> StoreResult<Option<Tier>> {
        let row = sqlx::query("SELECT key, label, rank FROM membership_tiers WHERE key = $1")
            .bind(key.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tier_by_key", e))?;

        row.as_ref().map(tier_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn tiers_by_rank(&self) -> StoreResult<Vec<Tier>> {
        let rows = sqlx::query("SELECT key, label, rank FROM membership_tiers ORDER BY rank ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tiers_by_rank", e))?;

        rows.iter().map(tier_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT
                u.id,
                u.email,
                u.password_hash,
                u.first_name,
                u.last_name,
                u.organisation_id,
                COALESCE(u.redeemed_benefit_codes, '{}') AS redeemed_benefit_codes,
                ARRAY(SELECT r.role_key FROM user_roles r WHERE r.user_id = u.id ORDER BY r.role_key) AS roles
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(organisation_id = %id), err)]
    async fn organisation(&self, id: OrganisationId) -> StoreResult<Option<Organisation>> {
        let row = sqlx::query("SELECT id, slug, name, kind FROM organisations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("organisation", e))?;

        row.as_ref().map(organisation_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn active_memberships(&self, user_id: UserId) -> StoreResult<Vec<ResolvedMembership>> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id,
                m.user_id,
                m.organisation_id,
                m.tier_key,
                m.is_active,
                m.status,
                m.expiry,
                m.manager_name,
                t.label AS tier_label,
                t.rank AS tier_rank
            FROM memberships m
            JOIN membership_tiers t ON t.key = m.tier_key
            WHERE m.user_id = $1 AND m.is_active
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("active_memberships", e))?;

        rows.iter()
            .map(|row| {
                let membership = membership_from_row(row)?;
                let tier = Tier::new(
                    membership.tier.clone(),
                    get::<String>(row, "tier_label")?,
                    get::<i32>(row, "tier_rank")?,
                );
                Ok(ResolvedMembership { membership, tier })
            })
            .collect()
    }

    #[instrument(skip(self), fields(app = %key), err)]
    async fn application(&self, key: &AppKey) -> StoreResult<Option<Application>> {
        let row = sqlx::query("SELECT key, name, base_path, description FROM apps WHERE key = $1")
            .bind(key.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("application", e))?;

        row.as_ref().map(application_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn applications(&self) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query("SELECT key, name, base_path, description FROM apps ORDER BY key ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("applications", e))?;

        rows.iter().map(application_from_row).collect()
    }

    #[instrument(skip(self), fields(app = %key), err)]
    async fn rules_for_app(&self, key: &AppKey) -> StoreResult<Vec<AccessRule>> {
        // One row per rule, or a single all-NULL rule row when the app has none.
        let rows = sqlx::query(
            r#"
            SELECT
                r.access_type,
                t.key AS tier_key,
                t.label AS tier_label,
                t.rank AS tier_rank
            FROM apps a
            LEFT JOIN app_access_rules r ON r.app_key = a.key
            LEFT JOIN membership_tiers t ON t.key = r.min_tier_key
            WHERE a.key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("rules_for_app", e))?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("application {key}")));
        }

        let mut rules = Vec::with_capacity(rows.len());
        for row in &rows {
            let parts = RuleRow {
                access_type: get(row, "access_type")?,
                tier_key: get(row, "tier_key")?,
                tier_label: get(row, "tier_label")?,
                tier_rank: get(row, "tier_rank")?,
            };
            if let Some(rule) = rule_from_parts(key, parts)? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    #[instrument(skip(self), fields(role = %role), err)]
    async fn report_snapshot(&self, role: &Role) -> StoreResult<ReportSnapshot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("report_snapshot.begin", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("report_snapshot.isolation", e))?;

        let tier_rows = sqlx::query("SELECT key, label, rank FROM membership_tiers ORDER BY rank ASC")
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("report_snapshot.tiers", e))?;

        let membership_rows = sqlx::query(
            r#"
            SELECT id, user_id, organisation_id, tier_key, is_active, status, expiry, manager_name
            FROM memberships
            WHERE is_active
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("report_snapshot.memberships", e))?;

        let holder_rows = sqlx::query("SELECT DISTINCT user_id FROM user_roles WHERE role_key = $1")
            .bind(role.as_str())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("report_snapshot.role_holders", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("report_snapshot.commit", e))?;

        let tiers = tier_rows.iter().map(tier_from_row).collect::<StoreResult<Vec<_>>>()?;
        let memberships = membership_rows
            .iter()
            .map(membership_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        let role_holders = holder_rows
            .iter()
            .map(|row| get::<Uuid>(row, "user_id").map(UserId::from_uuid))
            .collect::<StoreResult<HashSet<_>>>()?;

        Ok(ReportSnapshot {
            tiers,
            memberships,
            role_holders,
        })
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| map_sqlx_error(column, e))
}

fn tier_from_row(row: &PgRow) -> StoreResult<Tier> {
    Ok(Tier::new(
        TierKey::new(get::<String>(row, "key")?),
        get::<String>(row, "label")?,
        get::<i32>(row, "rank")?,
    ))
}

fn membership_from_row(row: &PgRow) -> StoreResult<Membership> {
    let status: String = get(row, "status")?;
    Ok(Membership {
        id: MembershipId::from_uuid(get(row, "id")?),
        user_id: UserId::from_uuid(get(row, "user_id")?),
        organisation_id: OrganisationId::from_uuid(get(row, "organisation_id")?),
        tier: TierKey::new(get::<String>(row, "tier_key")?),
        is_active: get(row, "is_active")?,
        status: status
            .parse::<MembershipStatus>()
            .map_err(|e| StoreError::InvalidRecord(format!("memberships.status: {e}")))?,
        expiry: get::<Option<DateTime<Utc>>>(row, "expiry")?,
        manager_name: get(row, "manager_name")?,
    })
}

fn application_from_row(row: &PgRow) -> StoreResult<Application> {
    Ok(Application {
        key: AppKey::new(get::<String>(row, "key")?),
        name: get(row, "name")?,
        base_path: get(row, "base_path")?,
        description: get(row, "description")?,
    })
}

fn organisation_from_row(row: &PgRow) -> StoreResult<Organisation> {
    let kind: String = get(row, "kind")?;
    let kind = match kind.as_str() {
        "INDUSTRY" => OrganisationKind::Industry,
        "ACADEMIC" => OrganisationKind::Academic,
        "INTERNAL" => OrganisationKind::Internal,
        other => {
            return Err(StoreError::InvalidRecord(format!("organisations.kind '{other}'")));
        }
    };
    Ok(Organisation {
        id: OrganisationId::from_uuid(get(row, "id")?),
        slug: get(row, "slug")?,
        name: get(row, "name")?,
        kind,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let roles: Vec<String> = get(row, "roles")?;
    Ok(User {
        id: UserId::from_uuid(get(row, "id")?),
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        first_name: get(row, "first_name")?,
        last_name: get(row, "last_name")?,
        organisation_id: get::<Option<Uuid>>(row, "organisation_id")?.map(OrganisationId::from_uuid),
        roles: roles.into_iter().map(Role::new).collect(),
        redeemed_benefit_codes: get(row, "redeemed_benefit_codes")?,
    })
}

/// Nullable columns of one `rules_for_app` row.
#[derive(Debug, Default)]
struct RuleRow {
    access_type: Option<String>,
    tier_key: Option<String>,
    tier_label: Option<String>,
    tier_rank: Option<i32>,
}

/// Turn a rule row into a rule.
///
/// The all-NULL row of an app without rules yields `None`, as does a rule
/// whose minimum tier is missing, since it can never match. An unknown
/// effect is an `InvalidRecord`, never a silent allow.
fn rule_from_parts(app: &AppKey, row: RuleRow) -> StoreResult<Option<AccessRule>> {
    let Some(access_type) = row.access_type else {
        return Ok(None);
    };
    let (Some(tier_key), Some(tier_label), Some(tier_rank)) = (row.tier_key, row.tier_label, row.tier_rank)
    else {
        return Ok(None);
    };

    let effect: AccessEffect = access_type
        .parse()
        .map_err(|e| StoreError::InvalidRecord(format!("app_access_rules.access_type: {e}")))?;

    Ok(Some(AccessRule {
        app: app.clone(),
        minimum_tier: Tier::new(TierKey::new(tier_key), tier_label, tier_rank),
        effect,
    }))
}

/// Map SQLx errors onto `StoreError` (see the module-level table).
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("{operation}: row not found")),
        sqlx::Error::ColumnNotFound(column) => {
            StoreError::InvalidRecord(format!("{operation}: missing column {column}"))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::InvalidRecord(format!("{operation}: cannot decode column {index}: {source}"))
        }
        sqlx::Error::Decode(source) => {
            StoreError::InvalidRecord(format!("{operation}: decode failed: {source}"))
        }
        sqlx::Error::TypeNotFound { type_name } => {
            StoreError::InvalidRecord(format!("{operation}: unknown type {type_name}"))
        }
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Unavailable(format!("{operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use alliances_access::AccessError;

    use super::*;

    #[test]
    fn connectivity_failures_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("tiers_by_rank", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("tiers_by_rank", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn decode_failures_are_invalid_records() {
        assert!(matches!(
            map_sqlx_error("user", sqlx::Error::ColumnNotFound("roles".to_string())),
            StoreError::InvalidRecord(_)
        ));
    }

    fn gold_row(access_type: &str) -> RuleRow {
        RuleRow {
            access_type: Some(access_type.to_string()),
            tier_key: Some("GOLD".to_string()),
            tier_label: Some("Gold Partner".to_string()),
            tier_rank: Some(3),
        }
    }

    #[test]
    fn rule_rows_become_rules() {
        let rule = rule_from_parts(&AppKey::TALENT_DISCOVERY, gold_row("ALLOW"))
            .unwrap()
            .unwrap();
        assert_eq!(rule.app, AppKey::TALENT_DISCOVERY);
        assert_eq!(rule.effect, AccessEffect::Allow);
        assert_eq!(rule.minimum_tier, Tier::new(TierKey::GOLD, "Gold Partner", 3));

        let deny = rule_from_parts(&AppKey::TALENT_DISCOVERY, gold_row("DENY")).unwrap().unwrap();
        assert_eq!(deny.effect, AccessEffect::Deny);
    }

    #[test]
    fn rule_rows_without_rule_or_tier_are_skipped() {
        let app = AppKey::TALENT_DISCOVERY;
        assert!(rule_from_parts(&app, RuleRow::default()).unwrap().is_none());

        let dangling = RuleRow {
            tier_key: None,
            tier_label: None,
            tier_rank: None,
            ..gold_row("ALLOW")
        };
        assert!(rule_from_parts(&app, dangling).unwrap().is_none());
    }

    #[test]
    fn unknown_effect_is_an_invalid_record() {
        let err = rule_from_parts(&AppKey::TALENT_DISCOVERY, gold_row("MAYBE")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
        assert!(matches!(AccessError::from(err), AccessError::InvalidRecord(_)));
    }

    #[test]
    fn row_not_found_is_not_found() {
        assert!(matches!(
            map_sqlx_error("user", sqlx::Error::RowNotFound),
            StoreError::NotFound(_)
        ));
    }
}

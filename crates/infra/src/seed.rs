//! Standard catalog and demo accounts for the in-memory store.

use tracing::info;

use alliances_access::{
    AccessEffect, AppKey, Application, Membership, Organisation, OrganisationKind, Role, TierKey,
    TierRegistry, User,
};
use alliances_core::{OrganisationId, UserId};

use crate::store::{InMemoryPortalStore, StoreResult};

/// The three portal applications with their descriptions.
pub fn standard_applications() -> Vec<Application> {
    vec![
        Application::new(AppKey::MEMBERSHIP_DASHBOARD, "Membership Dashboard", "/membership-dashboard")
            .with_description("Dashboard for membership information."),
        Application::new(AppKey::IXN_WORKFLOW_MANAGER, "IXN Workflow Manager", "/ixn-workflow-manager")
            .with_description("Workflow management system for IXN."),
        Application::new(AppKey::TALENT_DISCOVERY, "Talent Discovery", "/talent-discovery")
            .with_description("Talent discovery tools for partners."),
    ]
}

/// Default ALLOW rules: dashboard from Bronze, IXN from Silver, talent from Gold.
pub fn standard_rules() -> Vec<(AppKey, TierKey)> {
    vec![
        (AppKey::MEMBERSHIP_DASHBOARD, TierKey::BRONZE),
        (AppKey::IXN_WORKFLOW_MANAGER, TierKey::SILVER),
        (AppKey::TALENT_DISCOVERY, TierKey::GOLD),
    ]
}

/// Load tiers, applications and rules into an empty store.
pub async fn seed_catalog(store: &InMemoryPortalStore) -> StoreResult<()> {
    for tier in TierRegistry::standard().ordered_by_rank() {
        store.insert_tier(tier.clone()).await?;
    }
    for app in standard_applications() {
        store.insert_application(app).await?;
    }
    for (app, tier) in standard_rules() {
        store.add_rule(&app, &tier, AccessEffect::Allow).await?;
    }
    info!("seeded standard access catalog");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DemoAccounts {
    pub admin: UserId,
    /// One member per tier, ascending by rank.
    pub members: Vec<(TierKey, UserId)>,
}

/// An admin plus one active member per standard tier, each in its own organisation.
pub async fn seed_demo_members(store: &InMemoryPortalStore) -> StoreResult<DemoAccounts> {
    let mut admin = User::new(UserId::new(), "admin@alliances.example");
    admin.first_name = "Alliances".to_string();
    admin.last_name = "Team".to_string();
    admin.roles = vec![Role::ADMIN];
    let admin_id = admin.id;
    store.upsert_user(admin).await;

    let mut members = Vec::new();
    for tier in TierRegistry::standard().ordered_by_rank() {
        let slug = tier.key.as_str().to_ascii_lowercase();
        let organisation = Organisation {
            id: OrganisationId::new(),
            slug: format!("{slug}-partner"),
            name: format!("{} Industries", tier.label),
            kind: OrganisationKind::Industry,
        };

        let mut user = User::new(UserId::new(), format!("{slug}@partners.example"));
        user.first_name = tier.label.clone();
        user.last_name = "Contact".to_string();
        user.organisation_id = Some(organisation.id);
        user.roles = vec![Role::MEMBER];
        let user_id = user.id;

        let membership = Membership::active(user_id, organisation.id, tier.key.clone());

        store.upsert_organisation(organisation).await;
        store.upsert_user(user).await;
        store.upsert_membership(membership).await?;
        members.push((tier.key.clone(), user_id));
    }

    info!(admin = %admin_id, members = members.len(), "seeded demo accounts");
    Ok(DemoAccounts {
        admin: admin_id,
        members,
    })
}

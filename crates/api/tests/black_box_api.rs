use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;

use alliances_access::{Membership, Role, SessionClaims, TierKey, User};
use alliances_api::app::{self, AppServices};
use alliances_api::config::ApiConfig;
use alliances_core::{OrganisationId, UserId};
use alliances_infra::{InMemoryPortalStore, seed};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryPortalStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = Arc::new(InMemoryPortalStore::new());
        seed::seed_catalog(&store).await.expect("seed catalog");

        let config = ApiConfig::from_lookup(|_| None).expect("default config");
        let services = Arc::new(AppServices::new(store.clone(), &config));

        // Same router as prod, bound to an ephemeral port.
        let router = app::router(SECRET.as_bytes(), services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    /// Register a user holding `roles`, with one active membership per tier in `tiers`.
    async fn user(&self, roles: Vec<Role>, tiers: &[TierKey]) -> UserId {
        let mut user = User::new(UserId::new(), "someone@partners.example");
        user.first_name = "Sam".to_string();
        user.roles = roles;
        let id = user.id;
        self.store.upsert_user(user).await;

        for tier in tiers {
            self.store
                .upsert_membership(Membership::active(id, OrganisationId::new(), tier.clone()))
                .await
                .unwrap();
        }
        id
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let client = reqwest::Client::new();
        let mut req = client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_session(user: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode session")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.get("/health", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("/whoami", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        srv.get("/apps", Some("not-a-token")).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn identity_is_derived_from_session() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[TierKey::BRONZE]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/whoami", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "MEMBER"));
}

#[tokio::test]
async fn silver_member_sees_ixn_but_not_talent_discovery() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[TierKey::SILVER]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/apps", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let apps: serde_json::Value = res.json().await.unwrap();
    let granted: Vec<(String, bool)> = apps
        .as_array()
        .unwrap()
        .iter()
        .map(|a| (a["key"].as_str().unwrap().to_string(), a["granted"].as_bool().unwrap()))
        .collect();
    assert_eq!(
        granted,
        vec![
            ("IXN_WORKFLOW_MANAGER".to_string(), true),
            ("MEMBERSHIP_DASHBOARD".to_string(), true),
            ("TALENT_DISCOVERY".to_string(), false),
        ]
    );

    let res = srv.get("/apps/TALENT_DISCOVERY/enter", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "access_denied");
    assert!(body["message"].as_str().unwrap().contains("Alliances Team"));

    let res = srv.get("/apps/IXN_WORKFLOW_MANAGER/enter", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["base_path"], "/ixn-workflow-manager");
}

#[tokio::test]
async fn explanation_names_the_missing_tier() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[TierKey::SILVER]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/apps/TALENT_DISCOVERY/explain", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["granted"], false);
    assert_eq!(body["denial_reason"]["kind"], "tier_too_low");
    assert_eq!(body["caller_tier"]["key"], "SILVER");
}

#[tokio::test]
async fn unknown_app_is_not_found() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/apps/NOT_AN_APP/access", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "app_not_found");
}

#[tokio::test]
async fn tier_catalog_is_served_and_unknown_tier_is_not_found() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/tiers", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let tiers: serde_json::Value = res.json().await.unwrap();
    let keys: Vec<&str> = tiers
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["BRONZE", "SILVER", "GOLD", "PLATINUM"]);

    let res = srv.get("/tiers/GOLD", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let gold: serde_json::Value = res.json().await.unwrap();
    assert_eq!(gold["label"], "Gold Partner");
    assert_eq!(gold["rank"], 3);

    let res = srv.get("/tiers/DIAMOND", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "tier_not_found");
}

#[tokio::test]
async fn upgrade_takes_effect_on_the_next_request() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[TierKey::SILVER]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/apps/TALENT_DISCOVERY/access", Some(&token)).await;
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["granted"], false);

    srv.store
        .upsert_membership(Membership::active(user, OrganisationId::new(), TierKey::GOLD))
        .await
        .unwrap();

    let res = srv.get("/apps/TALENT_DISCOVERY/access", Some(&token)).await;
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["granted"], true);
}

#[tokio::test]
async fn member_dashboard_shows_highest_tier() {
    let srv = TestServer::spawn().await;
    let user = srv
        .user(vec![Role::MEMBER], &[TierKey::BRONZE, TierKey::GOLD])
        .await;
    let token = mint_session(user, vec![Role::MEMBER]);

    let res = srv.get("/dashboard", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "member");
    assert_eq!(body["summary"]["first_name"], "Sam");
    assert_eq!(body["summary"]["tier_label"], "Gold Partner");
}

#[tokio::test]
async fn member_without_membership_cannot_open_dashboard() {
    let srv = TestServer::spawn().await;
    let user = srv.user(vec![Role::MEMBER], &[]).await;
    let token = mint_session(user, vec![Role::MEMBER]);

    assert_eq!(srv.get("/dashboard", Some(&token)).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tier_report_is_admin_only_and_counts_members() {
    let srv = TestServer::spawn().await;
    let admin = srv.user(vec![Role::ADMIN], &[]).await;
    srv.user(vec![Role::MEMBER], &[TierKey::GOLD]).await;
    srv.user(vec![Role::MEMBER], &[TierKey::GOLD, TierKey::BRONZE]).await;
    let member = srv.user(vec![Role::MEMBER], &[TierKey::SILVER]).await;

    let member_token = mint_session(member, vec![Role::MEMBER]);
    assert_eq!(
        srv.get("/admin/tier-report", Some(&member_token)).await.status(),
        StatusCode::FORBIDDEN
    );

    let admin_token = mint_session(admin, vec![Role::ADMIN]);
    let res = srv.get("/admin/tier-report", Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let counts: Vec<u64> = body["tiers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![1, 1, 2, 0]);
    assert_eq!(body["total"], 4);

    let res = srv.get("/dashboard", Some(&admin_token)).await;
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "admin");
}

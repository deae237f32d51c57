use axum::{Router, routing::get};

pub mod admin;
pub mod apps;
pub mod dashboard;
pub mod system;
pub mod tiers;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/apps", get(apps::list_apps))
        .route("/apps/:app_key/access", get(apps::check_access))
        .route("/apps/:app_key/explain", get(apps::explain_access))
        .route("/apps/:app_key/enter", get(apps::enter_app))
        .route("/tiers", get(tiers::list_tiers))
        .route("/tiers/:tier_key", get(tiers::get_tier))
        .route("/dashboard", get(dashboard::dashboard))
        .nest("/admin", admin::router())
}

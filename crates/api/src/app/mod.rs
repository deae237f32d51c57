//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection, seeding, the access engine
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;
use crate::session::Hs256SessionVerifier;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(config.session_secret.as_bytes(), services))
}

/// Router over already-built services.
pub fn router(session_secret: &[u8], services: Arc<AppServices>) -> Router {
    let sessions = Arc::new(Hs256SessionVerifier::new(session_secret));
    let auth_state = middleware::AuthState { sessions };

    // Protected routes: require a verified session.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::trace_requests)))
}

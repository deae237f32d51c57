//! Administrative reporting routes (ADMIN role only).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use alliances_access::Role;

use crate::app::{errors, services::AppServices};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new().route("/tier-report", get(tier_report))
}

/// GET /admin/tier-report - active MEMBER memberships per tier
pub async fn tier_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    if !session.identity().is_admin() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "admin role required");
    }

    match services.engine.tier_member_counts(&Role::MEMBER).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

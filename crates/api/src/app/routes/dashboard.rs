use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use alliances_access::{AppKey, Role};

use crate::app::{errors, services::AppServices};
use crate::context::SessionContext;

/// GET /dashboard
///
/// Admins get the per-tier member counts; everyone else needs access to the
/// membership dashboard and gets their own summary.
pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    let identity = session.identity();

    if identity.is_admin() {
        return match services.engine.tier_member_counts(&Role::MEMBER).await {
            Ok(report) => Json(serde_json::json!({
                "view": "admin",
                "report": report,
            }))
            .into_response(),
            Err(e) => errors::access_error_to_response(e),
        };
    }

    match services
        .engine
        .can_access(identity, &AppKey::MEMBERSHIP_DASHBOARD)
        .await
    {
        Ok(true) => {}
        Ok(false) => return errors::access_denied(),
        Err(e) => return errors::access_error_to_response(e),
    }

    match services.engine.member_summary(identity).await {
        Ok(Some(summary)) => Json(serde_json::json!({
            "view": "member",
            "summary": summary,
        }))
        .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "user_not_found", "no user record for this session"),
        Err(e) => errors::access_error_to_response(e),
    }
}

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::SessionContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    let identity = session.identity();
    Json(serde_json::json!({
        "user_id": identity.user_id.to_string(),
        "roles": identity.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "expires_at": session.expires_at(),
    }))
}

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use alliances_access::AccessError;

/// Shown when a member opens an application their tier does not unlock.
pub const ACCESS_DENIED_MESSAGE: &str = "Your current membership tier does not provide access to this part of the Alliances Platform. If you would like to unlock additional tools such as IXN Workflow Manager or Talent Discovery, please contact the Alliances Team to discuss upgrading your membership tier.";

pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::AppNotFound(app) => json_error(
            StatusCode::NOT_FOUND,
            "app_not_found",
            format!("application {app} is not registered"),
        ),
        AccessError::TierNotFound(tier) => json_error(
            StatusCode::NOT_FOUND,
            "tier_not_found",
            format!("membership tier {tier} is not registered"),
        ),
        AccessError::StorageUnavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
        }
        AccessError::InvalidRecord(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid_record", msg)
        }
    }
}

pub fn access_denied() -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "access_denied", ACCESS_DENIED_MESSAGE)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

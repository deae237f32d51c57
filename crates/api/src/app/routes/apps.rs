//! Application navigation and access checks.
//!
//! Every handler re-evaluates access against the store; a denial is a 403,
//! an unknown application a 404, and a storage failure a 503.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use alliances_access::{AccessError, AppKey};
use alliances_infra::PortalStore;

use crate::app::{errors, services::AppServices};
use crate::context::SessionContext;

#[derive(Debug, Serialize)]
struct AppEntry {
    key: String,
    name: String,
    base_path: String,
    description: Option<String>,
    granted: bool,
}

/// GET /apps - every application with the caller's verdict
pub async fn list_apps(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match services.engine.accessible_apps(session.identity()).await {
        Ok(apps) => {
            let entries: Vec<AppEntry> = apps
                .into_iter()
                .map(|a| AppEntry {
                    key: a.app.key.to_string(),
                    name: a.app.name,
                    base_path: a.app.base_path,
                    description: a.app.description,
                    granted: a.granted,
                })
                .collect();
            Json(entries).into_response()
        }
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /apps/:app_key/access
pub async fn check_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(app_key): Path<String>,
) -> Response {
    let app = AppKey::new(app_key);
    match services.engine.can_access(session.identity(), &app).await {
        Ok(granted) => Json(serde_json::json!({
            "app": app,
            "granted": granted,
        }))
        .into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /apps/:app_key/explain
pub async fn explain_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(app_key): Path<String>,
) -> Response {
    let app = AppKey::new(app_key);
    match services.engine.explain_access(session.identity(), &app).await {
        Ok(explanation) => Json(explanation).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /apps/:app_key/enter - gate in front of an application's pages
pub async fn enter_app(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(app_key): Path<String>,
) -> Response {
    let app = AppKey::new(app_key);
    match services.engine.can_access(session.identity(), &app).await {
        Ok(true) => {}
        Ok(false) => return errors::access_denied(),
        Err(e) => return errors::access_error_to_response(e),
    }

    match services.engine.store().application(&app).await {
        Ok(Some(application)) => Json(serde_json::json!({
            "app": application.key,
            "name": application.name,
            "base_path": application.base_path,
        }))
        .into_response(),
        Ok(None) => errors::access_error_to_response(AccessError::AppNotFound(app)),
        Err(e) => errors::access_error_to_response(AccessError::from(e)),
    }
}

//! Read-only tier catalog.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::{IntoResponse, Response},
};

use alliances_access::TierKey;

use crate::app::{errors, services::AppServices};

/// GET /tiers - all tiers, ascending by rank
pub async fn list_tiers(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.engine.tiers_by_rank().await {
        Ok(tiers) => Json(tiers).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /tiers/:tier_key
pub async fn get_tier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(tier_key): Path<String>,
) -> Response {
    match services.engine.tier_by_key(&TierKey::new(tier_key)).await {
        Ok(tier) => Json(tier).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

//! Health check endpoint.

use axum::{extract::State, Json};

use super::utc_timestamp;
use crate::models::HealthResponse;
use crate::AppState;

/// GET /health - Liveness probe for monitoring tools and orchestrators.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        &state.config.app_version,
        utc_timestamp(),
    ))
}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use tracing::error;

use crate::app_state::AppState;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check)) // ✅ Liveness check
        .route("/health/ready", get(readiness_check)) // ✅ Readiness check
}

/// **Liveness Check (Basic Check)**
/// - ✅ Verifies that the API is running
/// - ❌ Does NOT check the database
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "API is running"))
)]
pub async fn liveness_check() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API is live" }))
}

/// **Readiness Check (Store Connectivity Check)**
/// - ✅ Pings the record store
/// - ❌ Returns `500` if the store does not answer
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 500, description = "Store unavailable")
    )
)]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    state.store.ping().await.map_err(|e| {
        error!("❌ Readiness check failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Database unavailable" })),
        )
    })?;

    Ok(Json(json!({ "success": true, "message": "API is ready" })))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(liveness_check, readiness_check),
    tags((name = "Health", description = "Liveness and readiness probes"))
)]
pub struct HealthDoc;

/**
 * Router Configuration
 *
 * Combines every route group into one Axum router:
 *
 * 1. `/api/v1/...` - REST surface, behind the auth middleware
 * 2. `/ws`, `/realtime` - real-time transports, authenticated per request
 * 3. `/health` - public liveness probe
 *
 * Request tracing and CORS wrap the whole router.
 */

use axum::{extract::State, http::StatusCode, middleware, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth_middleware;
use crate::backend::routes::api_routes::api_v1_routes;
use crate::backend::routes::chat_routes::configure_realtime_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let api = api_v1_routes().layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    let router = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health));

    configure_realtime_routes(router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// GET /health
///
/// 200 when the ephemeral cache answers, 503 otherwise. The durable store is
/// not probed: every request path reports its failures on its own.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.cache.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "cache": "ok" })),
        ),
        Err(e) => {
            tracing::warn!("[Server] Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded", "cache": e.to_string() })),
            )
        }
    }
}

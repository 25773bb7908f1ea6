/**
 * Real-time Routes
 *
 * - `GET /ws` - WebSocket transport; authenticates itself so an invalid
 *   token still upgrades into an unauthenticated session
 * - `GET /realtime?topics=` - SSE stream of hub topics
 */

use axum::{routing::get, Router};

use crate::backend::realtime::handle_realtime_subscription;
use crate::backend::server::state::AppState;
use crate::backend::ws::ws_handler;

/// Configure real-time routes
pub fn configure_realtime_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/ws", get(ws_handler))
        .route("/realtime", get(handle_realtime_subscription))
}

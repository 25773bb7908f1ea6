/**
 * Server Initialization
 *
 * 1. Load the chat configuration
 * 2. Select the durable store, user directory and cache
 * 3. Build the services (starts the analysis worker)
 * 4. Start the periodic hub cleanup
 * 5. Create the router
 */

use axum::Router;
use std::time::Duration;

use crate::backend::auth::TokenVerifier;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_ai_responder, load_cache, load_chat_config, load_mood_analyzer, load_store};
use crate::backend::server::state::{AppState, Collaborators};
use crate::shared::ChatConfig;

/// How often topic channels without subscribers are dropped
const HUB_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Create and configure the Axum application
///
/// An invalid configuration is logged and replaced by the defaults.
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing TeamChat backend server");

    let config = load_chat_config().unwrap_or_else(|e| {
        tracing::error!("[Config] Invalid configuration, using defaults: {}", e);
        ChatConfig::default()
    });
    tracing::info!("[Config] {:?}", config);

    let (store, directory) = load_store().await;
    let cache = load_cache().await;

    let app_state = AppState::build(
        config,
        Collaborators {
            store,
            cache,
            directory,
            analyzer: load_mood_analyzer(),
            responder: load_ai_responder(),
            verifier: TokenVerifier::from_env(),
        },
    );

    spawn_hub_cleanup(&app_state);

    let app = create_router(app_state);
    tracing::info!("Router configured with periodic cleanup task");
    app
}

fn spawn_hub_cleanup(app_state: &AppState) {
    let hub = app_state.hub.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HUB_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let dropped = hub.cleanup_inactive_channels();
            tracing::debug!(
                "[Realtime] Dropped {} inactive channels, {} remain",
                dropped,
                hub.channel_count()
            );
        }
    });
}

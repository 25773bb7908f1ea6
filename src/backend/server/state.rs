/**
 * Application State Management
 *
 * `AppState` wires the chat core's services together and implements the
 * `FromRef` traits handlers use to extract a single service.
 *
 * Every field is cheap to clone: services hold their collaborators behind
 * `Arc`s and the hub shares its channel map.
 *
 * # Example
 *
 * ```rust
 * use axum::extract::State;
 * use teamchat::backend::presence::PresenceTracker;
 *
 * async fn handler(State(presence): State<PresenceTracker>) -> String {
 *     presence.online_users().await.join(",")
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::backend::analysis::{
    spawn_analysis_worker, AiChatService, AiResponder, AnalysisTrigger, MoodAnalyzer, MoodHistoryStore,
    ANALYSIS_QUEUE_CAPACITY,
};
use crate::backend::auth::{TokenVerifier, UserDirectory};
use crate::backend::cache::EphemeralCache;
use crate::backend::chat::{MessageDeliveryService, RoomService};
use crate::backend::presence::PresenceTracker;
use crate::backend::realtime::RealtimeHub;
use crate::backend::receipts::ReadReceiptTracker;
use crate::backend::store::ChatStore;
use crate::shared::ChatConfig;

/// Central state container of the Axum application
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub store: Arc<dyn ChatStore>,
    pub cache: Arc<dyn EphemeralCache>,
    pub hub: RealtimeHub,
    pub presence: PresenceTracker,
    pub delivery: MessageDeliveryService,
    pub rooms: RoomService,
    pub receipts: ReadReceiptTracker,
    pub ai_chat: AiChatService,
    /// Latest analysed moods per user
    pub moods: MoodHistoryStore,
    pub directory: Arc<dyn UserDirectory>,
    pub verifier: TokenVerifier,
}

/// External collaborators the state is built from
pub struct Collaborators {
    pub store: Arc<dyn ChatStore>,
    pub cache: Arc<dyn EphemeralCache>,
    pub directory: Arc<dyn UserDirectory>,
    pub analyzer: Arc<dyn MoodAnalyzer>,
    pub responder: Arc<dyn AiResponder>,
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Build every service and start the analysis worker.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(config: ChatConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            cache,
            directory,
            analyzer,
            responder,
            verifier,
        } = collaborators;
        let config = Arc::new(config);

        let hub = RealtimeHub::new(config.broadcast_capacity);
        let presence = PresenceTracker::new(cache.clone(), hub.clone(), config.presence_settle_delay);
        let receipts = ReadReceiptTracker::new(store.clone(), cache.clone(), hub.clone(), config.read_lookback);
        let rooms = RoomService::new(store.clone(), directory.clone(), receipts.clone());

        let moods = MoodHistoryStore::default();
        let (task_tx, task_rx) = mpsc::channel(ANALYSIS_QUEUE_CAPACITY);
        spawn_analysis_worker(task_rx, analyzer, moods.clone());
        let trigger = AnalysisTrigger::new(cache.clone(), store.clone(), task_tx, &config);

        let delivery = MessageDeliveryService::new(
            store.clone(),
            cache.clone(),
            hub.clone(),
            directory.clone(),
            config.clone(),
        )
        .with_analysis(trigger);
        let ai_chat = AiChatService::new(delivery.clone(), rooms.clone(), responder);

        tracing::info!("[Server] Chat services initialized");

        Self {
            config,
            store,
            cache,
            hub,
            presence,
            delivery,
            rooms,
            receipts,
            ai_chat,
            moods,
            directory,
            verifier,
        }
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for RealtimeHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for PresenceTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for MessageDeliveryService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.delivery.clone()
    }
}

impl FromRef<AppState> for RoomService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}

impl FromRef<AppState> for ReadReceiptTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.receipts.clone()
    }
}

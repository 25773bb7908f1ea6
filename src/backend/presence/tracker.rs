/**
 * Presence Tracker
 *
 * Turns connection lifecycle events into online/offline broadcasts on the
 * `presence` topic.
 *
 * # Sources of truth
 *
 * - The per-instance `SessionRegistry` knows which sessions are live here.
 * - The cache's online set is shared by every instance and decides whether a
 *   transition actually happened: only the call that changed the set
 *   broadcasts.
 *
 * # Offline reconciliation
 *
 * When the last session of a user closes, the user is not removed at once.
 * A per-user debounce waits `settle_delay` so a concurrent REST logout or a
 * quick reconnect can land first. A reconnect cancels the pending task; a
 * logout makes the task find the user already gone. Either way at most one
 * offline broadcast is emitted.
 *
 * Cache failures never block connection handling: the session mapping is
 * kept, and a failed reconciliation still broadcasts offline once.
 */

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use super::registry::SessionRegistry;
use crate::backend::cache::EphemeralCache;
use crate::backend::realtime::RealtimeHub;
use crate::shared::chat::UserStatusMessage;
use crate::shared::RealtimeEvent;

/// What a disconnect led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The session was never registered (unauthenticated or already removed)
    UnknownSession,
    /// The user still has another live session on this instance
    OtherSessionsRemain,
    /// The user's offline reconciliation was scheduled
    OfflineScheduled,
}

struct PendingOffline {
    generation: u64,
    handle: AbortHandle,
}

struct TrackerInner {
    registry: SessionRegistry,
    pending: DashMap<String, PendingOffline>,
    cache: Arc<dyn EphemeralCache>,
    hub: RealtimeHub,
    settle_delay: Duration,
    generation: AtomicU64,
}

impl TrackerInner {
    fn broadcast_status(&self, user_id: &str, online: bool) {
        let status = if online {
            UserStatusMessage::online(user_id)
        } else {
            UserStatusMessage::offline(user_id)
        };
        match RealtimeEvent::presence(&status) {
            Ok(event) => {
                let receivers = self.hub.publish(event);
                debug!(
                    "[Presence] {} is {} (delivered to {} subscribers)",
                    user_id,
                    if online { "online" } else { "offline" },
                    receivers
                );
            }
            Err(e) => error!("[Presence] Failed to build status event for {}: {}", user_id, e),
        }
    }

    /// Runs after the settle delay for a user whose last session closed
    async fn reconcile_offline(&self, user_id: &str, generation: u64) {
        self.pending
            .remove_if(user_id, |_, pending| pending.generation == generation);

        if self.registry.has_sessions(user_id) {
            debug!("[Presence] {} reconnected during settle window", user_id);
            return;
        }

        match self.cache.is_online(user_id).await {
            Ok(true) => match self.cache.remove_online_user(user_id).await {
                Ok(true) => {
                    info!("[Presence] {} removed from online set", user_id);
                    self.broadcast_status(user_id, false);
                }
                Ok(false) => {
                    info!("[Presence] {} removed concurrently, skipping broadcast", user_id);
                }
                Err(e) => {
                    error!("[Presence] Failed to remove {} from online set: {}", user_id, e);
                    self.broadcast_status(user_id, false);
                }
            },
            Ok(false) => {
                info!("[Presence] {} already offline (likely logged out)", user_id);
            }
            Err(e) => {
                error!("[Presence] Failed to check online set for {}: {}", user_id, e);
                self.broadcast_status(user_id, false);
            }
        }
    }
}

/// Connection-driven presence with debounce-based offline reconciliation
#[derive(Clone)]
pub struct PresenceTracker {
    inner: Arc<TrackerInner>,
}

impl PresenceTracker {
    pub fn new(cache: Arc<dyn EphemeralCache>, hub: RealtimeHub, settle_delay: Duration) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                registry: SessionRegistry::new(),
                pending: DashMap::new(),
                cache,
                hub,
                settle_delay,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// A transport connection was opened.
    ///
    /// Returns the user id when the connection is authenticated. Anonymous
    /// connections are logged and otherwise ignored.
    pub fn on_connect(&self, session_id: &str, principal: Option<&str>) -> Option<String> {
        match principal.filter(|p| !p.trim().is_empty()) {
            Some(user_id) => {
                info!("[Presence] Authenticated connect: session={} user={}", session_id, user_id);
                Some(user_id.to_string())
            }
            None => {
                warn!("[Presence] Unauthenticated connect ignored: session={}", session_id);
                None
            }
        }
    }

    /// An authenticated session finished its handshake.
    ///
    /// Returns `true` when this session brought the user online and an
    /// online broadcast was emitted.
    pub async fn on_connected(&self, session_id: &str, user_id: &str) -> bool {
        let inner = &self.inner;

        if let Some((_, pending)) = inner.pending.remove(user_id) {
            pending.handle.abort();
            debug!("[Presence] Cancelled pending offline for {}", user_id);
        }

        inner.registry.register(session_id, user_id);

        match inner.cache.add_online_user(user_id).await {
            Ok(true) => {
                info!("[Presence] {} is now online (session {})", user_id, session_id);
                inner.broadcast_status(user_id, true);
                true
            }
            Ok(false) => {
                debug!("[Presence] {} already online, skipping broadcast", user_id);
                false
            }
            Err(e) => {
                error!("[Presence] Failed to add {} to online set: {}", user_id, e);
                false
            }
        }
    }

    /// A transport connection closed
    pub fn on_disconnect(&self, session_id: &str) -> DisconnectOutcome {
        let inner = &self.inner;

        let Some(user_id) = inner.registry.remove(session_id) else {
            warn!("[Presence] Disconnect for unknown session {}", session_id);
            return DisconnectOutcome::UnknownSession;
        };

        if inner.registry.has_sessions(&user_id) {
            info!("[Presence] {} still has live sessions", user_id);
            return DisconnectOutcome::OtherSessionsRemain;
        }

        let generation = inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let task_inner = Arc::clone(inner);
        let task_user = user_id.clone();
        let delay = inner.settle_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task_inner.reconcile_offline(&task_user, generation).await;
        })
        .abort_handle();

        if let Some(previous) = inner
            .pending
            .insert(user_id.clone(), PendingOffline { generation, handle })
        {
            previous.handle.abort();
        }

        debug!("[Presence] Offline for {} scheduled in {:?}", user_id, delay);
        DisconnectOutcome::OfflineScheduled
    }

    /// Explicit logout. Removes the user from the online set and broadcasts
    /// offline regardless of live sessions; the session map is left alone.
    pub async fn logout(&self, user_id: &str) {
        let inner = &self.inner;

        if let Some((_, pending)) = inner.pending.remove(user_id) {
            pending.handle.abort();
        }

        match inner.cache.remove_online_user(user_id).await {
            Ok(removed) => info!("[Presence] {} logged out (was in online set: {})", user_id, removed),
            Err(e) => error!("[Presence] Failed to remove {} on logout: {}", user_id, e),
        }
        inner.broadcast_status(user_id, false);
    }

    /// Online users according to the shared set; empty if the cache is unavailable
    pub async fn online_users(&self) -> Vec<String> {
        match self.inner.cache.online_users().await {
            Ok(users) => users,
            Err(e) => {
                error!("[Presence] Failed to read online users: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.inner.cache.is_online(user_id).await.unwrap_or(false)
    }

    /// User bound to a live session of this instance
    pub fn user_of(&self, session_id: &str) -> Option<String> {
        self.inner.registry.user_of(session_id)
    }

    pub fn session_count(&self, user_id: &str) -> usize {
        self.inner.registry.session_count(user_id)
    }

    /// Users whose offline reconciliation is still waiting
    pub fn pending_offline_count(&self) -> usize {
        self.inner.pending.len()
    }
}

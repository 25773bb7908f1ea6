/**
 * Real-time Event Broadcasting
 *
 * `RealtimeHub` keeps one `tokio::sync::broadcast` channel per topic. A
 * topic's channel is created on first subscription; publishing to a topic
 * nobody listens to is a cheap no-op. Channels whose last receiver went
 * away are dropped by `cleanup_inactive_channels`, which the server runs
 * periodically.
 */

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::shared::RealtimeEvent;

/// Broadcast channel of a single topic
pub type RealtimeEventBroadcast = broadcast::Sender<RealtimeEvent>;

/// Broadcast a real-time event on one channel
///
/// # Returns
///
/// Number of active subscribers that received the event (0 if no subscribers)
pub fn broadcast_event(broadcast_tx: &RealtimeEventBroadcast, event: RealtimeEvent) -> usize {
    let topic = event.topic.clone();
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("[Realtime] Event on {} broadcast to {} subscribers", topic, subscriber_count);
            subscriber_count
        }
        Err(_) => {
            // No subscribers, that's okay
            tracing::debug!("[Realtime] No subscribers on {}", topic);
            0
        }
    }
}

/// Topic-keyed fan-out shared by every transport
#[derive(Clone)]
pub struct RealtimeHub {
    channels: Arc<DashMap<String, RealtimeEventBroadcast>>,
    capacity: usize,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe while the entry guard is held, so cleanup cannot drop the
    /// channel between creation and subscription
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<RealtimeEvent> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish an event on its own topic
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        // Clone the sender out so the map shard is not held across send
        let sender = self.channels.get(&event.topic).map(|entry| entry.value().clone());
        match sender {
            Some(sender) => broadcast_event(&sender, event),
            None => {
                tracing::debug!("[Realtime] No channel for {}", event.topic);
                0
            }
        }
    }

    /// Drop channels without receivers
    pub fn cleanup_inactive_channels(&self) -> usize {
        let mut removed = 0;
        self.channels.retain(|_, sender| {
            let live = sender.receiver_count() > 0;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(1000)
    }
}

//! Broadcast bus carrying change events.
//!
//! - tokio::sync::broadcast for pub-sub fan-out
//! - Slow subscribers lose the oldest events instead of blocking publishers

use async_trait::async_trait;
use tokio::sync::broadcast::{self, Receiver, Sender};

use super::{ChangeEvent, ChangeNotifier, PublishError, CHANGE_CHANNEL};

/// Change event bus on the [`CHANGE_CHANNEL`] channel.
///
/// Publishing never waits: the event is copied into the ring buffer and the
/// call returns. Subscribers that fall more than `capacity` events behind
/// observe a lag and skip ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<ChangeEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of buffered events.
    ///   Older events are dropped if subscribers fall behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will receive all future events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Send an event to every current subscriber.
    ///
    /// # Returns
    ///
    /// The number of receivers that received the event.
    pub fn send(&self, event: ChangeEvent) -> usize {
        // send() returns an error if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl ChangeNotifier for EventBus {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        let delivered = self.send(event.clone());
        tracing::trace!(
            channel = CHANGE_CHANNEL,
            event_id = %event.event_id,
            delivered,
            "Change event published"
        );
        Ok(())
    }
}

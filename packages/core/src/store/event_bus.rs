//! Event Bus
//!
//! Fire-and-forget publication of node notifications. The dev server wires
//! a `BroadcastEventBus` between the node service (publisher) and the
//! content-generation consumer task; production deployments can substitute
//! any `EventPublisher`.

use crate::models::Notification;
use crate::store::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Default channel capacity; slow consumers past this point observe lag,
/// not backpressure
pub const DEFAULT_BUS_CAPACITY: usize = 128;

/// Sink for node notifications
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a notification. Delivery is best-effort; publication must
    /// not fail just because nobody is listening.
    async fn publish(&self, notification: Notification) -> Result<()>;
}

/// In-process event bus over a tokio broadcast channel
pub struct BroadcastEventBus {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Open a new subscription receiving notifications published after
    /// this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventBus {
    async fn publish(&self, notification: Notification) -> Result<()> {
        // send() errors only when no receiver exists, which is a valid
        // state for a fire-and-forget bus
        let _ = self.sender.send(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, NotificationKind};

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = BroadcastEventBus::default();
        let mut rx = bus.subscribe();

        let node = Node::new("s1".to_string(), "Rust".to_string(), None, 0);
        bus.publish(Notification::node_created(&node)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.detail_type, NotificationKind::Created);
        assert_eq!(received.detail.node_id, node.node_id);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = BroadcastEventBus::default();
        let node = Node::new("s1".to_string(), "Rust".to_string(), None, 0);

        assert!(bus.publish(Notification::node_created(&node)).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_starts_at_subscribe_time() {
        let bus = BroadcastEventBus::default();
        let node = Node::new("s1".to_string(), "Rust".to_string(), None, 0);

        bus.publish(Notification::node_created(&node)).await.unwrap();
        let mut rx = bus.subscribe();
        bus.publish(Notification::node_updated(&node)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.detail_type, NotificationKind::Updated);
    }
}

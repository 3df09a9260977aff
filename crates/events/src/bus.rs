//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`; producers such as the import
//! worker publish [`Notification`]s and any number of subscribers receive
//! each one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;
use vstack_core::notification::NotificationLevel;
use vstack_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A message addressed to one user (or to nobody in particular when the
/// action was anonymous).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Time-ordered id (UUID v7).
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            level,
            message: message.into(),
            user_id: None,
            created_at: Utc::now(),
        }
    }

    /// Address the notification to a user.
    pub fn for_user(mut self, user_id: Option<DbId>) -> Self {
        self.user_id = user_id;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus.
///
/// ```rust
/// use vstack_core::notification::NotificationLevel;
/// use vstack_events::bus::{EventBus, Notification};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(Notification::new(NotificationLevel::Info, "hello"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread messages are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is listening.
    pub fn publish(&self, notification: Notification) {
        tracing::debug!(
            level = notification.level.as_str(),
            user_id = ?notification.user_id,
            message = %notification.message,
            "Publishing notification"
        );
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            Notification::new(NotificationLevel::Success, "2 Usuários importados com sucesso !!")
                .for_user(Some(7)),
        );

        let received = rx.recv().await.expect("should receive the notification");
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.user_id, Some(7));
        assert_eq!(received.message, "2 Usuários importados com sucesso !!");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_notification() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Notification::new(NotificationLevel::Info, "multi"));

        let n1 = rx1.recv().await.expect("subscriber 1 should receive");
        let n2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(n1.id, n2.id);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(Notification::new(NotificationLevel::Error, "orphan"));
    }
}

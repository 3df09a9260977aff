//! Per-user notification inbox.
//!
//! [`NotificationInbox::run`] subscribes to the [`EventBus`](crate::EventBus)
//! and files every [`Notification`] under its recipient. The HTTP layer reads
//! it back with [`NotificationInbox::for_user`].

use std::collections::{HashMap, VecDeque};

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use vstack_core::types::DbId;

use crate::bus::Notification;

/// How many notifications are kept per recipient.
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

/// In-memory store of the most recent notifications, keyed by user id.
/// Notifications without a recipient are filed under `None`.
pub struct NotificationInbox {
    entries: RwLock<HashMap<Option<DbId>, VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationInbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// File one notification, evicting the oldest when the recipient's
    /// inbox is full.
    pub async fn push(&self, notification: Notification) {
        let mut entries = self.entries.write().await;
        let queue = entries.entry(notification.user_id).or_default();
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(notification);
    }

    /// Newest first.
    pub async fn for_user(&self, user_id: Option<DbId>) -> Vec<Notification> {
        self.entries
            .read()
            .await
            .get(&user_id)
            .map(|queue| queue.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Consume the bus until it closes or `cancel` fires.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<Notification>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Notification inbox started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification inbox stopping (cancelled)");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(notification) => self.push(notification).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification inbox lagged, some notifications were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, notification inbox shutting down");
                        break;
                    }
                },
            }
        }
    }
}

impl Default for NotificationInbox {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vstack_core::notification::NotificationLevel;

    use super::*;
    use crate::bus::EventBus;

    fn note(user: Option<DbId>, text: &str) -> Notification {
        Notification::new(NotificationLevel::Info, text).for_user(user)
    }

    #[tokio::test]
    async fn keeps_notifications_per_user_newest_first() {
        let inbox = NotificationInbox::default();
        inbox.push(note(Some(1), "first")).await;
        inbox.push(note(Some(2), "other")).await;
        inbox.push(note(Some(1), "second")).await;

        let messages: Vec<_> = inbox
            .for_user(Some(1))
            .await
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(inbox.for_user(Some(2)).await.len(), 1);
        assert!(inbox.for_user(None).await.is_empty());
    }

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let inbox = NotificationInbox::new(2);
        for text in ["a", "b", "c"] {
            inbox.push(note(None, text)).await;
        }
        let messages: Vec<_> = inbox
            .for_user(None)
            .await
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn run_files_bus_traffic_until_cancelled() {
        let bus = EventBus::default();
        let inbox = Arc::new(NotificationInbox::default());
        let cancel = CancellationToken::new();

        let handle = {
            let inbox = Arc::clone(&inbox);
            let receiver = bus.subscribe();
            let cancel = cancel.clone();
            tokio::spawn(async move { inbox.run(receiver, cancel).await })
        };

        bus.publish(note(Some(5), "hello"));
        // Give the subscriber a chance to drain the channel.
        for _ in 0..50 {
            if !inbox.for_user(Some(5)).await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(inbox.for_user(Some(5)).await[0].message, "hello");

        cancel.cancel();
        handle.await.expect("inbox task should stop cleanly");
    }

    #[tokio::test]
    async fn run_exits_when_bus_dropped() {
        let bus = EventBus::default();
        let inbox = NotificationInbox::default();
        let receiver = bus.subscribe();
        drop(bus);
        inbox.run(receiver, CancellationToken::new()).await;
    }
}

//! In-process fan-out of account activity changes to connected listeners.
//!
//! Owned by [`crate::AppState`] and injected where needed. Publishing never fails the
//! caller: with no listeners, or with listeners that fell behind, events are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStatusChanged {
    pub account_id: i64,
    pub active: bool,
    pub changed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<ActiveStatusChanged>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ActiveStatusChanged) {
        match self.sender.send(event) {
            Ok(delivered) => tracing::debug!(delivered, "active status change published"),
            Err(_) => tracing::debug!("active status change dropped, no listeners"),
        }
    }

    /// The listener stays registered for as long as the returned guard lives.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<ActiveStatusChanged>,
}

impl Subscription {
    /// Next event, skipping over anything missed while lagging. `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<ActiveStatusChanged> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl futures::Stream<Item = ActiveStatusChanged> {
        use futures::StreamExt;

        BroadcastStream::new(self.receiver).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "stream listener lagged behind");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(account_id: i64, active: bool) -> ActiveStatusChanged {
        ActiveStatusChanged {
            account_id,
            active,
            changed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let notifier = Notifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish(event(3, false));

        assert_eq!(first.recv().await.unwrap().account_id, 3);
        assert_eq!(second.recv().await.unwrap().account_id, 3);
    }

    #[test]
    fn publishing_without_listeners_is_a_no_op() {
        let notifier = Notifier::new(8);
        notifier.publish(event(1, true));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn dropping_a_subscription_releases_the_listener() {
        let notifier = Notifier::new(8);
        let subscription = notifier.subscribe();
        assert_eq!(notifier.listener_count(), 1);
        drop(subscription);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn lagging_listener_skips_to_the_oldest_retained_event() {
        let notifier = Notifier::new(2);
        let mut subscription = notifier.subscribe();
        for id in 1..=4 {
            notifier.publish(event(id, true));
        }
        assert_eq!(subscription.recv().await.unwrap().account_id, 3);
        assert_eq!(subscription.recv().await.unwrap().account_id, 4);
    }
}

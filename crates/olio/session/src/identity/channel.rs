//! Broadcast channel for auth events with explicit unsubscribe tokens.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::AuthEvent;

/// Identifier of one subscription, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Single-producer, multi-consumer fan-out of [`AuthEvent`]s.
pub struct AuthEventChannel {
    sender: broadcast::Sender<AuthEvent>,
    next_id: AtomicU64,
}

impl AuthEventChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: AtomicU64::new(1),
        }
    }

    /// Publish an event. Returns how many subscribers will see it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        debug!(kind = %event.kind, "Publishing auth event");
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> AuthSubscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        AuthSubscription {
            id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEventChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Receiving end of an auth event subscription.
///
/// This is the unsubscribe token: dropping it, or calling
/// [`unsubscribe`](Self::unsubscribe), ends the subscription.
pub struct AuthSubscription {
    id: SubscriptionId,
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, or `None` once the channel is closed.
    ///
    /// A subscriber that fell behind skips the events it missed; the
    /// coordinator only cares about the latest transitions.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = self.id.0, skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        debug!(subscription = self.id.0, "Auth subscription dropped");
    }
}

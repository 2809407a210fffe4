//! Typed auth-state notifications.
//!
//! Components that care about login/logout subscribe explicitly; nothing is
//! broadcast to the process as a whole.

use phanto_core::UserId;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 16;

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in (login or auto-login after registration).
    LoggedIn { user_id: UserId },
    /// The session was cleared.
    LoggedOut,
}

/// Publish/subscribe channel for [`AuthEvent`]s.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    /// Create a channel buffering `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns how many subscribers received it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        debug!(?event, "Publishing auth event");
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    /// Register a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let events = AuthEvents::default();
        let mut rx = events.subscribe();

        assert_eq!(
            events.publish(AuthEvent::LoggedIn {
                user_id: UserId::new(4)
            }),
            1
        );
        events.publish(AuthEvent::LoggedOut);

        assert_eq!(
            rx.recv().await.unwrap(),
            AuthEvent::LoggedIn {
                user_id: UserId::new(4)
            }
        );
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::LoggedOut);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = AuthEvents::default();
        assert_eq!(events.publish(AuthEvent::LoggedOut), 0);
    }
}

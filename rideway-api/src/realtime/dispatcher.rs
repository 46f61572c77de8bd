use std::sync::Arc;

use tracing::{debug, warn};

use rideway_rides::notification::Notification;

use super::registry::SocketRegistry;

/// Pushes notification intents out over whatever connection currently
/// represents the target party. Delivery is at most once: an offline
/// party simply misses the event.
pub struct Dispatcher {
    registry: Arc<SocketRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SocketRegistry>) -> Self {
        Self { registry }
    }

    pub fn deliver(&self, notification: Notification) {
        let payload = match serde_json::to_value(&notification.event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode event: {}", e);
                return;
            }
        };

        // Direct binding first, then any connection in the party's group.
        if let Some(id) = self.registry.connection_for(&notification.to) {
            if let Some(sender) = self.registry.sender(id) {
                if sender.send(payload.clone()).is_ok() {
                    return;
                }
            }
            debug!(party = %notification.to.group_name(), "direct connection is gone");
        }

        let mut delivered = false;
        for id in self.registry.group_members(&notification.to.group_name()) {
            if let Some(sender) = self.registry.sender(id) {
                if sender.send(payload.clone()).is_ok() {
                    delivered = true;
                }
            }
        }

        if !delivered {
            debug!(
                party = %notification.to.group_name(),
                "no live connection, dropping event"
            );
        }
    }

    pub fn deliver_all(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            self.deliver(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rideway_rides::notification::{Party, RideEvent};
    use rideway_core::geo::Coordinate;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn location_event() -> RideEvent {
        RideEvent::CaptainLocationUpdate {
            location: Coordinate::new(28.6139, 77.2090),
        }
    }

    #[test]
    fn delivers_to_bound_connection() {
        let registry = Arc::new(SocketRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let party = Party::user(Uuid::new_v4());

        registry.register(id, tx);
        registry.join(id, party);

        dispatcher.deliver(Notification {
            to: party,
            event: location_event(),
        });

        let payload = rx.try_recv().unwrap();
        assert_eq!(payload["event"], "captain-location-update");
    }

    #[test]
    fn falls_back_to_group_when_binding_is_stale() {
        let registry = Arc::new(SocketRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        let party = Party::user(Uuid::new_v4());

        // A live group member whose sender works.
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let live = Uuid::new_v4();
        registry.register(live, live_tx);
        registry.join(live, party);

        // A newer binding whose connection has already been dropped.
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);
        let dead = Uuid::new_v4();
        registry.register(dead, dead_tx);
        registry.join(dead, party);

        dispatcher.deliver(Notification {
            to: party,
            event: location_event(),
        });

        assert!(live_rx.try_recv().is_ok());
    }

    #[test]
    fn offline_party_drops_event() {
        let registry = Arc::new(SocketRegistry::new());
        let dispatcher = Dispatcher::new(registry);

        // No connections at all. Nothing to assert beyond not panicking.
        dispatcher.deliver(Notification {
            to: Party::captain(Uuid::new_v4()),
            event: location_event(),
        });
    }
}

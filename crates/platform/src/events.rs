// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Catalog event fan-out to any number of async subscribers

use sqlmeta_cache::{CatalogEvent, EventSink};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of events a slow subscriber may lag behind
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcasts [`CatalogEvent`]s from every cache of the platform
///
/// Subscribers that fall more than the channel capacity behind receive
/// `RecvError::Lagged` and skip the missed events.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<CatalogEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send `event`; returns the number of subscribers reached
    pub fn publish(&self, event: CatalogEvent) -> usize {
        // No subscribers is not an error: events are fire-and-forget.
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventSink for EventBus {
    fn notify(&self, event: CatalogEvent) {
        trace!("{:?} {} {}", event.action, event.kind, event.path);
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmeta_cache::EventAction;
    use sqlmeta_model::{ObjectKind, ObjectPath};

    fn event(name: &str) -> CatalogEvent {
        CatalogEvent::new(
            EventAction::Add,
            ObjectKind::Table,
            ObjectPath::new(["public", name]),
        )
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_events() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(event("orders")), 2);
        assert_eq!(first.recv().await.unwrap(), event("orders"));
        assert_eq!(second.recv().await.unwrap(), event("orders"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(event("orders")), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for name in ["a", "b", "c"] {
            bus.notify(event(name));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap(), event("b"));
    }
}

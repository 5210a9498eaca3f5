use tokio::sync::broadcast;
use tracing::{debug, info};

use ridepool_core::events::EventSink;
use ridepool_shared::DomainEvent;

/// In-process event bus. Subscribers that fall behind lose the oldest events.
#[derive(Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: DomainEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscriber(s)", kind, receivers),
            Err(_) => debug!("Published {} with no subscribers", kind),
        }
    }
}

/// Logs every event the bus carries. Runs until the bus is dropped.
pub async fn log_events(mut receiver: broadcast::Receiver<DomainEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(payload) => info!(kind = event.kind(), "{}", payload),
                Err(e) => tracing::warn!("Unserializable {} event: {}", event.kind(), e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event log fell behind, {} events skipped", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_shared::models::events::OfferPublishedEvent;
    use uuid::Uuid;

    fn published() -> DomainEvent {
        DomainEvent::OfferPublished(OfferPublishedEvent {
            offer_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            total_seats: 2,
            timestamp: 0,
        })
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = BroadcastEventSink::new(8);
        let mut rx = bus.subscribe();
        let event = published();
        bus.publish(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = BroadcastEventSink::new(8);
        bus.publish(published());
    }
}

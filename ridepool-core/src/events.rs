use ridepool_shared::DomainEvent;

/// Where services record what happened. Publishing must never block or fail the caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Drops everything.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, event: DomainEvent) {
        tracing::trace!("Dropping {} event", event.kind());
    }
}

pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

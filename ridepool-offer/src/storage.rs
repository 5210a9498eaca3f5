use std::sync::Arc;

use uuid::Uuid;

use ridepool_catalog::SeatLedger;
use ridepool_core::events::EventSink;
use ridepool_core::models::Event;
use ridepool_core::repository::{
    EventRepository, JoinRequestRepository, OfferRepository, RequestRepository,
};
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::DomainEvent;

/// Everything the stores and the join request engine persist to, bundled so one
/// handle can be cloned into each service.
#[derive(Clone)]
pub struct Storage {
    pub events: Arc<dyn EventRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub join_requests: Arc<dyn JoinRequestRepository>,
    pub ledger: Arc<dyn SeatLedger>,
    pub sink: Arc<dyn EventSink>,
}

impl Storage {
    pub fn publish(&self, event: DomainEvent) {
        self.sink.publish(event);
    }

    /// Load an event that is still active, or `NotFound`.
    pub async fn active_event(&self, event_id: Uuid) -> CoreResult<Event> {
        match self.events.get_event(event_id).await? {
            Some(event) if event.is_active() => Ok(event),
            _ => Err(CoreError::not_found("event", event_id)),
        }
    }

    /// Load an active event on behalf of `viewer`. Private events need the access code
    /// unless the viewer organizes them.
    pub async fn accessible_event(
        &self,
        event_id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<Event> {
        let event = self.active_event(event_id).await?;
        check_privacy(&event, viewer, access_code)?;
        Ok(event)
    }

    /// Privacy check for records that hang off an event, whatever state the event is in.
    pub async fn ensure_event_visible(
        &self,
        event_id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<()> {
        let event = self
            .events
            .get_event(event_id)
            .await?
            .ok_or_else(|| CoreError::not_found("event", event_id))?;
        check_privacy(&event, viewer, access_code)
    }
}

fn check_privacy(event: &Event, viewer: Option<&str>, access_code: Option<&str>) -> CoreResult<()> {
    if viewer.is_some_and(|v| event.is_organized_by(v)) || event.admits(access_code) {
        return Ok(());
    }
    tracing::warn!("Access code rejected for private event {}", event.id);
    Err(CoreError::Forbidden(format!("event {} is private", event.id)))
}

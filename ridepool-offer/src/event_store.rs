use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_core::events::now_ts;
use ridepool_core::identity::Identity;
use ridepool_core::models::{Event, EventStatus, RequestStatus};
use ridepool_core::routing::BoundedRouter;
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::models::events::EventCancelledEvent;
use ridepool_shared::DomainEvent;

use crate::cascade::{self, EVENT_CANCELLED};
use crate::drafts::{EventDraft, EventPatch};
use crate::rules;
use crate::storage::Storage;

/// What deleting an event took down with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCancellation {
    pub event_id: Uuid,
    pub cancelled_offers: usize,
    pub cancelled_requests: usize,
}

#[derive(Clone)]
pub struct EventStore {
    storage: Storage,
    router: BoundedRouter,
}

impl EventStore {
    pub fn new(storage: Storage, router: BoundedRouter) -> Self {
        Self { storage, router }
    }

    pub async fn create_event(&self, organizer: &Identity, draft: EventDraft) -> CoreResult<Event> {
        rules::validate_event_draft(&draft)?;
        let destination = self.router.resolve(&draft.destination).await?;

        let mut event = Event::new(
            organizer.subject.clone(),
            draft.name.trim().to_string(),
            draft.starts_at,
            draft.ends_at,
            destination,
        );
        event.is_private = draft.is_private;
        event.access_code = draft.access_code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        self.storage.events.insert_event(&event).await?;
        tracing::info!("Event {} created by {}", event.id, event.organizer_id);
        Ok(event)
    }

    /// The organizer sees the access code; everyone else gets the public view.
    pub async fn get_event(&self, id: Uuid, viewer: Option<&str>, access_code: Option<&str>) -> CoreResult<Event> {
        let event = self.storage.accessible_event(id, viewer, access_code).await?;
        if viewer.is_some_and(|v| event.is_organized_by(v)) {
            Ok(event)
        } else {
            Ok(event.public_view())
        }
    }

    /// Succeeds when `viewer` may see the event: public, organized by them, or the code matches.
    pub async fn check_access(&self, id: Uuid, viewer: Option<&str>, access_code: Option<&str>) -> CoreResult<()> {
        self.storage.accessible_event(id, viewer, access_code).await.map(|_| ())
    }

    pub async fn update_event(&self, caller: &str, id: Uuid, patch: EventPatch) -> CoreResult<Event> {
        let mut event = self.organized(caller, id).await?;

        if let Some(name) = patch.name {
            rules::validate_event_name(&name)?;
            event.name = name.trim().to_string();
        }
        if let Some(starts_at) = patch.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            event.ends_at = Some(ends_at);
        }
        if event.ends_at.is_some_and(|ends_at| ends_at <= event.starts_at) {
            return Err(CoreError::Validation("an event must end after it starts".to_string()));
        }

        if let Some(access_code) = patch.access_code {
            event.access_code = Some(access_code.trim().to_string()).filter(|c| !c.is_empty());
        }
        if let Some(is_private) = patch.is_private {
            event.is_private = is_private;
        }
        rules::validate_privacy(event.is_private, event.access_code.as_deref())?;

        if let Some(destination) = patch.destination {
            event.destination = self.router.resolve(&destination).await?;
        }

        event.touch();
        self.storage.events.update_event(&event).await?;
        tracing::info!("Event {} updated", id);
        Ok(event)
    }

    /// Soft-delete the event and cancel everything posted on it. Confirmed passengers get
    /// their seats released on the way.
    pub async fn delete_event(&self, caller: &str, id: Uuid) -> CoreResult<EventCancellation> {
        let mut event = self.organized(caller, id).await?;
        event.status = EventStatus::Deleted;
        event.touch();
        self.storage.events.update_event(&event).await?;

        let mut cancelled_offers = 0;
        for offer in self.storage.offers.list_offers_by_event(id).await? {
            if offer.is_active() {
                cascade::withdraw_offer(&self.storage, offer, EVENT_CANCELLED).await?;
                cancelled_offers += 1;
            }
        }

        let mut cancelled_requests = 0;
        for mut request in self.storage.requests.list_requests_by_event(id).await? {
            if request.is_open() {
                request.update_status(RequestStatus::Cancelled);
                self.storage.requests.update_request(&request).await?;
                cancelled_requests += 1;
            }
        }

        tracing::info!(
            "Event {} deleted: {} offers and {} requests cancelled",
            id,
            cancelled_offers,
            cancelled_requests
        );
        self.storage.publish(DomainEvent::EventCancelled(EventCancelledEvent {
            event_id: id,
            cancelled_offers,
            cancelled_requests,
            timestamp: now_ts(),
        }));

        Ok(EventCancellation {
            event_id: id,
            cancelled_offers,
            cancelled_requests,
        })
    }

    async fn organized(&self, caller: &str, id: Uuid) -> CoreResult<Event> {
        let event = self.storage.active_event(id).await?;
        if !event.is_organized_by(caller) {
            return Err(CoreError::Forbidden(format!("event {} is organized by someone else", id)));
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::{Duration, Utc};
    use ridepool_core::geo::PlaceQuery;
    use ridepool_core::models::{JoinStatus, OfferStatus, TripType};

    #[tokio::test]
    async fn test_private_event_is_hidden_without_code() {
        let fx = Fixture::private().await;
        let id = fx.event.id;

        assert!(matches!(
            fx.events.get_event(id, Some("stranger"), None).await,
            Err(CoreError::Forbidden(_))
        ));
        let seen = fx.events.get_event(id, Some("stranger"), Some(ACCESS_CODE)).await.unwrap();
        assert!(seen.access_code.is_none());

        let own = fx.events.get_event(id, Some("organizer"), None).await.unwrap();
        assert_eq!(own.access_code.as_deref(), Some(ACCESS_CODE));

        assert!(fx.events.check_access(id, None, Some("wrong")).await.is_err());
        assert!(fx.events.check_access(id, None, Some(ACCESS_CODE)).await.is_ok());
        assert!(fx.events.check_access(id, Some("organizer"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_geocodes_destination() {
        let fx = Fixture::new().await;
        let event = fx
            .events
            .create_event(
                &organizer(),
                EventDraft {
                    name: "  Closing Party ".to_string(),
                    starts_at: Utc::now() + Duration::days(3),
                    ends_at: None,
                    destination: PlaceQuery::address("arena"),
                    is_private: false,
                    access_code: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(event.name, "Closing Party");
        assert_eq!(event.destination.point, ARENA);
    }

    #[tokio::test]
    async fn test_update_is_organizer_only() {
        let fx = Fixture::new().await;
        let patch = EventPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fx.events.update_event("driver", fx.event.id, patch.clone()).await,
            Err(CoreError::Forbidden(_))
        ));
        let updated = fx.events.update_event("organizer", fx.event.id, patch).await.unwrap();
        assert_eq!(updated.name, "Renamed");

        let backwards = EventPatch {
            ends_at: Some(fx.event.starts_at - Duration::hours(2)),
            ..Default::default()
        };
        assert!(matches!(
            fx.events.update_event("organizer", fx.event.id, backwards).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_releases_seats() {
        let fx = Fixture::new().await;
        let offer = fx
            .offers
            .create_offer(&driver(), offer_draft(fx.event.id, 3, both_legs()))
            .await
            .unwrap();
        let request = fx
            .requests
            .create_request(&passenger(), request_draft(fx.event.id, TripType::Going, 2))
            .await
            .unwrap();
        let confirmed = seed_join_request(&fx.storage, &offer.offer, "passenger", 2, JoinStatus::Confirmed).await;
        let pending = seed_join_request(&fx.storage, &offer.offer, "other", 1, JoinStatus::Pending).await;

        let summary = fx.events.delete_event("organizer", fx.event.id).await.unwrap();
        assert_eq!(summary.cancelled_offers, 1);
        assert_eq!(summary.cancelled_requests, 1);

        let stored = fx.storage.offers.get_offer(offer.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OfferStatus::Cancelled);
        assert_eq!(fx.storage.ledger.snapshot(offer.offer.id).await.unwrap().confirmed, 0);

        for id in [confirmed, pending] {
            let jr = fx.storage.join_requests.get_join_request(id).await.unwrap().unwrap();
            assert_eq!(jr.status, JoinStatus::Cancelled);
            assert_eq!(jr.cancel_reason.as_deref(), Some(EVENT_CANCELLED));
        }
        let request = fx.storage.requests.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Cancelled);

        assert!(matches!(
            fx.events.get_event(fx.event.id, None, None).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(fx.published().iter().any(|e| e.kind() == "event_cancelled"));
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use ridepool_core::models::{Event, JoinRequest, JoinStatus, Offer, RideRequest};
use ridepool_core::repository::{
    EventRepository, JoinRequestRepository, OfferRepository, RequestRepository,
};
use ridepool_core::{CoreError, CoreResult};

/// Process-local repositories. Used for development and tests; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    events: RwLock<HashMap<Uuid, Event>>,
    offers: RwLock<HashMap<Uuid, Offer>>,
    requests: RwLock<HashMap<Uuid, RideRequest>>,
    join_requests: RwLock<HashMap<Uuid, JoinRequest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_id(kind: &str, id: Uuid) -> CoreError {
    CoreError::Storage(format!("{} {} already exists", kind, id))
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn insert_event(&self, event: &Event) -> CoreResult<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(duplicate_id("event", event.id));
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn update_event(&self, event: &Event) -> CoreResult<()> {
        match self.events.write().await.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(())
            }
            None => Err(CoreError::not_found("event", event.id)),
        }
    }
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()> {
        let mut offers = self.offers.write().await;
        if offers.contains_key(&offer.id) {
            return Err(duplicate_id("offer", offer.id));
        }
        offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn get_offer(&self, id: Uuid) -> CoreResult<Option<Offer>> {
        Ok(self.offers.read().await.get(&id).cloned())
    }

    async fn update_offer(&self, offer: &Offer) -> CoreResult<()> {
        match self.offers.write().await.get_mut(&offer.id) {
            Some(stored) => {
                *stored = offer.clone();
                Ok(())
            }
            None => Err(CoreError::not_found("offer", offer.id)),
        }
    }

    async fn remove_offer(&self, id: Uuid) -> CoreResult<()> {
        self.offers
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("offer", id))
    }

    async fn list_offers_by_event(&self, event_id: Uuid) -> CoreResult<Vec<Offer>> {
        let mut offers: Vec<Offer> = self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.event_id == event_id)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.created_at);
        Ok(offers)
    }

    async fn list_offers_by_owner(&self, owner_id: &str) -> CoreResult<Vec<Offer>> {
        let mut offers: Vec<Offer> = self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.created_at);
        Ok(offers)
    }
}

#[async_trait]
impl RequestRepository for InMemoryStore {
    async fn insert_request(&self, request: &RideRequest) -> CoreResult<()> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(duplicate_id("request", request.id));
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> CoreResult<Option<RideRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn update_request(&self, request: &RideRequest) -> CoreResult<()> {
        match self.requests.write().await.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(())
            }
            None => Err(CoreError::not_found("request", request.id)),
        }
    }

    async fn list_requests_by_event(&self, event_id: Uuid) -> CoreResult<Vec<RideRequest>> {
        let mut requests: Vec<RideRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn list_requests_by_owner(&self, owner_id: &str) -> CoreResult<Vec<RideRequest>> {
        let mut requests: Vec<RideRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }
}

#[async_trait]
impl JoinRequestRepository for InMemoryStore {
    async fn insert_join_request(&self, join_request: &JoinRequest) -> CoreResult<()> {
        let mut join_requests = self.join_requests.write().await;
        if join_requests.contains_key(&join_request.id) {
            return Err(duplicate_id("join request", join_request.id));
        }
        let open_duplicate = join_requests.values().any(|jr| {
            jr.offer_id == join_request.offer_id
                && jr.requester_id == join_request.requester_id
                && jr.is_open()
        });
        if open_duplicate {
            return Err(CoreError::DuplicateJoinRequest {
                offer_id: join_request.offer_id,
                requester: join_request.requester_id.clone(),
            });
        }
        join_requests.insert(join_request.id, join_request.clone());
        Ok(())
    }

    async fn get_join_request(&self, id: Uuid) -> CoreResult<Option<JoinRequest>> {
        Ok(self.join_requests.read().await.get(&id).cloned())
    }

    async fn list_join_requests_by_offer(&self, offer_id: Uuid) -> CoreResult<Vec<JoinRequest>> {
        let mut found: Vec<JoinRequest> = self
            .join_requests
            .read()
            .await
            .values()
            .filter(|jr| jr.offer_id == offer_id)
            .cloned()
            .collect();
        found.sort_by_key(|jr| jr.created_at);
        Ok(found)
    }

    async fn list_join_requests_by_requester(&self, requester_id: &str) -> CoreResult<Vec<JoinRequest>> {
        let mut found: Vec<JoinRequest> = self
            .join_requests
            .read()
            .await
            .values()
            .filter(|jr| jr.requester_id == requester_id)
            .cloned()
            .collect();
        found.sort_by_key(|jr| jr.created_at);
        Ok(found)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: JoinStatus,
        to: JoinStatus,
        reason: Option<String>,
    ) -> CoreResult<Option<JoinRequest>> {
        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let mut join_requests = self.join_requests.write().await;
        let stored = join_requests
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("join request", id))?;
        if stored.status != from {
            return Ok(None);
        }
        stored.update_status(to, reason);
        Ok(Some(stored.clone()))
    }

    async fn set_passenger_count(&self, id: Uuid, passenger_count: u32) -> CoreResult<Option<JoinRequest>> {
        let mut join_requests = self.join_requests.write().await;
        let stored = join_requests
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("join request", id))?;
        if stored.status != JoinStatus::Pending {
            return Ok(None);
        }
        stored.passenger_count = passenger_count;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, JoinRequest, JoinStatus, Offer, RideRequest};
use crate::CoreResult;

/// Repository trait for event data access
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert_event(&self, event: &Event) -> CoreResult<()>;

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>>;

    async fn update_event(&self, event: &Event) -> CoreResult<()>;
}

/// Repository trait for offer data access
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()>;

    async fn get_offer(&self, id: Uuid) -> CoreResult<Option<Offer>>;

    async fn update_offer(&self, offer: &Offer) -> CoreResult<()>;

    /// Physical removal. Only used when no join request history exists.
    async fn remove_offer(&self, id: Uuid) -> CoreResult<()>;

    async fn list_offers_by_event(&self, event_id: Uuid) -> CoreResult<Vec<Offer>>;

    async fn list_offers_by_owner(&self, owner_id: &str) -> CoreResult<Vec<Offer>>;
}

/// Repository trait for passenger ride requests
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert_request(&self, request: &RideRequest) -> CoreResult<()>;

    async fn get_request(&self, id: Uuid) -> CoreResult<Option<RideRequest>>;

    async fn update_request(&self, request: &RideRequest) -> CoreResult<()>;

    async fn list_requests_by_event(&self, event_id: Uuid) -> CoreResult<Vec<RideRequest>>;

    async fn list_requests_by_owner(&self, owner_id: &str) -> CoreResult<Vec<RideRequest>>;
}

/// Repository trait for join requests.
///
/// Status changes go through [`JoinRequestRepository::transition`], a compare-and-set:
/// concurrent callers racing on the same record see exactly one winner.
#[async_trait]
pub trait JoinRequestRepository: Send + Sync {
    /// Fails with `DuplicateJoinRequest` while the requester already has an open
    /// (pending or confirmed) join request on the same offer.
    async fn insert_join_request(&self, join_request: &JoinRequest) -> CoreResult<()>;

    async fn get_join_request(&self, id: Uuid) -> CoreResult<Option<JoinRequest>>;

    async fn list_join_requests_by_offer(&self, offer_id: Uuid) -> CoreResult<Vec<JoinRequest>>;

    async fn list_join_requests_by_requester(&self, requester_id: &str) -> CoreResult<Vec<JoinRequest>>;

    /// Move `id` from `from` to `to`. Returns `None` when the stored status is not `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: JoinStatus,
        to: JoinStatus,
        reason: Option<String>,
    ) -> CoreResult<Option<JoinRequest>>;

    /// Change the passenger count of a pending join request. Returns `None` when it is no longer pending.
    async fn set_passenger_count(&self, id: Uuid, passenger_count: u32) -> CoreResult<Option<JoinRequest>>;
}

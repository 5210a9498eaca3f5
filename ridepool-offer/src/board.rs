use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ridepool_core::identity::Identity;
use ridepool_core::models::{OfferView, RideRequest};
use ridepool_core::CoreResult;

use crate::drafts::ListingDraft;
use crate::offer_store::OfferStore;
use crate::request_store::RequestStore;

/// A published listing: either side of a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Listing {
    Offer(OfferView),
    Request(RideRequest),
}

/// Single entry point for posting on an event's board.
#[derive(Clone)]
pub struct RideBoard {
    offers: Arc<OfferStore>,
    requests: Arc<RequestStore>,
}

impl RideBoard {
    pub fn new(offers: Arc<OfferStore>, requests: Arc<RequestStore>) -> Self {
        Self { offers, requests }
    }

    pub async fn create(&self, owner: &Identity, draft: ListingDraft) -> CoreResult<Listing> {
        match draft {
            ListingDraft::Offer(offer) => self.offers.create_offer(owner, offer).await.map(Listing::Offer),
            ListingDraft::Request(request) => self
                .requests
                .create_request(owner, request)
                .await
                .map(Listing::Request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use ridepool_core::models::TripType;

    #[tokio::test]
    async fn test_dispatches_on_kind() {
        let fx = Fixture::new().await;
        let board = RideBoard::new(Arc::new(fx.offers.clone()), Arc::new(fx.requests.clone()));

        let offer = board
            .create(&driver(), ListingDraft::Offer(offer_draft(fx.event.id, 2, both_legs())))
            .await
            .unwrap();
        assert!(matches!(offer, Listing::Offer(ref v) if v.available_seats == 2));

        let request = board
            .create(
                &passenger(),
                ListingDraft::Request(request_draft(fx.event.id, TripType::Return, 1)),
            )
            .await
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "request");
        assert_eq!(json["passenger_count"], 1);
    }
}

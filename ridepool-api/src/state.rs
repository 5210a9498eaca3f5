use std::sync::Arc;

use ridepool_booking::JoinRequestEngine;
use ridepool_catalog::{PickupProjector, PriceCapCalculator};
use ridepool_core::identity::IdentityProvider;
use ridepool_core::routing::BoundedRouter;
use ridepool_offer::{EventStore, OfferStore, RequestStore, RideBoard, Storage};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventStore>,
    pub offers: Arc<OfferStore>,
    pub requests: Arc<RequestStore>,
    pub board: Arc<RideBoard>,
    pub join_requests: Arc<JoinRequestEngine>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire the services over one storage bundle and one router.
    pub fn new(
        storage: Storage,
        router: BoundedRouter,
        pricing: PriceCapCalculator,
        projector: PickupProjector,
        identity: Arc<dyn IdentityProvider>,
        auth: AuthConfig,
    ) -> Self {
        let offers = Arc::new(OfferStore::new(storage.clone(), router.clone(), pricing));
        let requests = Arc::new(RequestStore::new(storage.clone()));
        Self {
            events: Arc::new(EventStore::new(storage.clone(), router.clone())),
            board: Arc::new(RideBoard::new(offers.clone(), requests.clone())),
            join_requests: Arc::new(JoinRequestEngine::new(storage, router, projector)),
            offers,
            requests,
            identity,
            auth,
        }
    }
}

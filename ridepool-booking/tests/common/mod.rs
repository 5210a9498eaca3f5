#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use ridepool_booking::{JoinRequestEngine, JoinSubmission};
use ridepool_catalog::{InMemorySeatLedger, PickupProjector, PriceCapCalculator};
use ridepool_core::geo::{GeoPoint, PlaceQuery, EARTH_RADIUS_KM};
use ridepool_core::identity::Identity;
use ridepool_core::repository::JoinRequestRepository;
use ridepool_core::models::{ContactCard, Event, Gender, LegKind, Offer, PaymentPolicy, Preference};
use ridepool_core::routing::{BoundedRouter, StraightLineRouter};
use ridepool_offer::{
    EventDraft, EventStore, LegDraft, ListingBase, OfferDraft, OfferStore, RequestStore, Storage,
};
use ridepool_shared::DomainEvent;
use ridepool_store::events::BroadcastEventSink;
use ridepool_store::memory::InMemoryStore;

pub const HOME: GeoPoint = GeoPoint { lat: 50.00, lng: 19.00 };
pub const ARENA: GeoPoint = GeoPoint { lat: 50.10, lng: 19.00 };

pub struct World {
    pub storage: Storage,
    pub events: EventStore,
    pub offers: OfferStore,
    pub requests: RequestStore,
    pub engine: Arc<JoinRequestEngine>,
    pub event: Event,
    pub bus: Arc<BroadcastEventSink>,
}

impl World {
    pub async fn new() -> Self {
        let repos = Arc::new(InMemoryStore::new());
        Self::with_join_requests(repos.clone(), repos).await
    }

    /// Same world, with join requests stored through `join_requests`.
    pub async fn with_join_requests(
        repos: Arc<InMemoryStore>,
        join_requests: Arc<dyn JoinRequestRepository>,
    ) -> Self {
        let bus = Arc::new(BroadcastEventSink::new(256));
        let storage = Storage {
            events: repos.clone(),
            offers: repos.clone(),
            requests: repos,
            join_requests,
            ledger: Arc::new(InMemorySeatLedger::new()),
            sink: bus.clone(),
        };

        let router = BoundedRouter::new(
            Arc::new(
                StraightLineRouter::default()
                    .with_place("Home", HOME)
                    .with_place("Arena", ARENA)
                    .with_place("Petrol station", km_east(GeoPoint::new(50.05, 19.0), 2.0)),
            ),
            Duration::from_secs(1),
        );

        let events = EventStore::new(storage.clone(), router.clone());
        let offers = OfferStore::new(storage.clone(), router.clone(), PriceCapCalculator::default());
        let requests = RequestStore::new(storage.clone());
        let engine = Arc::new(JoinRequestEngine::new(
            storage.clone(),
            router,
            PickupProjector::new(40.0),
        ));

        let event = events
            .create_event(
                &person("organizer", Gender::Female),
                EventDraft {
                    name: "Harvest Festival".to_string(),
                    starts_at: Utc::now() + chrono::Duration::days(10),
                    ends_at: None,
                    destination: PlaceQuery::at("Arena", ARENA),
                    is_private: false,
                    access_code: None,
                },
            )
            .await
            .unwrap();

        Self {
            storage,
            events,
            offers,
            requests,
            engine,
            event,
            bus,
        }
    }

    /// A round-trip offer from `HOME` by the driver "driver".
    pub async fn offer(&self, total_seats: u32) -> Offer {
        let draft = OfferDraft {
            base: ListingBase {
                event_id: self.event.id,
                access_code: None,
                contact: ContactCard::from_identity(&driver()),
                preference: Preference::Any,
                notes: None,
            },
            total_seats,
            legs: vec![
                LegDraft {
                    kind: LegKind::Going,
                    endpoint: PlaceQuery::address("Home"),
                    departs_at: None,
                },
                LegDraft {
                    kind: LegKind::Return,
                    endpoint: PlaceQuery::address("Home"),
                    departs_at: None,
                },
            ],
            payment: PaymentPolicy::free(),
        };
        self.offers.create_offer(&driver(), draft).await.unwrap().offer
    }

    pub async fn available(&self, offer_id: Uuid) -> u32 {
        self.storage.ledger.snapshot(offer_id).await.unwrap().available()
    }

    pub async fn confirmed(&self, offer_id: Uuid) -> u32 {
        self.storage.ledger.snapshot(offer_id).await.unwrap().confirmed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.bus.subscribe()
    }
}

pub fn person(subject: &str, gender: Gender) -> Identity {
    Identity {
        subject: subject.to_string(),
        name: subject.to_uppercase(),
        phone: Some("+48 501 501 501".to_string()),
        email: Some(format!("{}@example.com", subject)),
        gender: Some(gender),
    }
}

pub fn driver() -> Identity {
    person("driver", Gender::Male)
}

pub fn rider(subject: &str) -> Identity {
    person(subject, Gender::Female)
}

/// Ask for `count` seats on the going leg, picked up right at the driver's start.
pub fn submission(who: &Identity, count: u32) -> JoinSubmission {
    JoinSubmission {
        passenger_count: count,
        leg: LegKind::Going,
        pickup: PlaceQuery::at("Home", HOME),
        contact: ContactCard::from_identity(who),
        note: None,
        access_code: None,
    }
}

pub fn km_east(p: GeoPoint, km: f64) -> GeoPoint {
    let dlng = (km / (EARTH_RADIUS_KM * p.lat.to_radians().cos())).to_degrees();
    GeoPoint::new(p.lat, p.lng + dlng)
}

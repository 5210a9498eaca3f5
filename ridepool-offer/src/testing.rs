use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use ridepool_catalog::{InMemorySeatLedger, PriceCapCalculator};
use ridepool_core::events::EventSink;
use ridepool_core::geo::{GeoPoint, Place, PlaceQuery};
use ridepool_core::identity::Identity;
use ridepool_core::models::{
    ContactCard, Event, Gender, JoinRequest, JoinStatus, LegKind, Offer, PaymentPolicy, PickupProjection,
    Preference, TripType,
};
use ridepool_core::routing::{BoundedRouter, StraightLineRouter};
use ridepool_shared::DomainEvent;
use ridepool_store::memory::InMemoryStore;

use crate::drafts::{EventDraft, LegDraft, ListingBase, OfferDraft, RequestDraft};
use crate::{EventStore, OfferStore, RequestStore, Storage};

pub const HOME: GeoPoint = GeoPoint { lat: 50.00, lng: 19.00 };
pub const ARENA: GeoPoint = GeoPoint { lat: 50.10, lng: 19.00 };
pub const ACCESS_CODE: &str = "backstage";

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl EventSink for RecordingSink {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Fixture {
    pub storage: Storage,
    pub events: EventStore,
    pub offers: OfferStore,
    pub requests: RequestStore,
    pub event: Event,
    sink: Arc<RecordingSink>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(false).await
    }

    pub async fn private() -> Self {
        Self::build(true).await
    }

    async fn build(is_private: bool) -> Self {
        let repos = Arc::new(InMemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let storage = Storage {
            events: repos.clone(),
            offers: repos.clone(),
            requests: repos.clone(),
            join_requests: repos,
            ledger: Arc::new(InMemorySeatLedger::new()),
            sink: sink.clone(),
        };

        let router = BoundedRouter::new(
            Arc::new(
                StraightLineRouter::default()
                    .with_place("Home", HOME)
                    .with_place("Arena", ARENA),
            ),
            Duration::from_secs(1),
        );

        let events = EventStore::new(storage.clone(), router.clone());
        let offers = OfferStore::new(storage.clone(), router, PriceCapCalculator::default());
        let requests = RequestStore::new(storage.clone());

        let event = events
            .create_event(
                &organizer(),
                EventDraft {
                    name: "Open Air".to_string(),
                    starts_at: Utc::now() + ChronoDuration::days(7),
                    ends_at: None,
                    destination: PlaceQuery::at("Arena", ARENA),
                    is_private,
                    access_code: is_private.then(|| ACCESS_CODE.to_string()),
                },
            )
            .await
            .unwrap();

        Self {
            storage,
            events,
            offers,
            requests,
            event,
            sink,
        }
    }

    pub fn published(&self) -> Vec<DomainEvent> {
        self.sink.events.lock().unwrap().clone()
    }
}

fn identity(subject: &str, name: &str, gender: Gender) -> Identity {
    Identity {
        subject: subject.to_string(),
        name: name.to_string(),
        phone: Some("+48 500 100 200".to_string()),
        email: Some(format!("{}@example.com", subject)),
        gender: Some(gender),
    }
}

pub fn organizer() -> Identity {
    identity("organizer", "Olga", Gender::Female)
}

pub fn driver() -> Identity {
    identity("driver", "Darek", Gender::Male)
}

pub fn passenger() -> Identity {
    identity("passenger", "Paula", Gender::Female)
}

pub fn both_legs() -> Vec<LegDraft> {
    vec![
        LegDraft {
            kind: LegKind::Going,
            endpoint: PlaceQuery::address("Home"),
            departs_at: None,
        },
        LegDraft {
            kind: LegKind::Return,
            endpoint: PlaceQuery::at("Home", HOME),
            departs_at: None,
        },
    ]
}

pub fn going_only() -> Vec<LegDraft> {
    both_legs().into_iter().take(1).collect()
}

fn base(event_id: Uuid, who: &Identity) -> ListingBase {
    ListingBase {
        event_id,
        access_code: None,
        contact: ContactCard::from_identity(who),
        preference: Preference::Any,
        notes: None,
    }
}

pub fn offer_draft(event_id: Uuid, total_seats: u32, legs: Vec<LegDraft>) -> OfferDraft {
    OfferDraft {
        base: base(event_id, &driver()),
        total_seats,
        legs,
        payment: PaymentPolicy::free(),
    }
}

pub fn request_draft(event_id: Uuid, trip_type: TripType, passenger_count: u32) -> RequestDraft {
    RequestDraft {
        base: base(event_id, &passenger()),
        trip_type,
        passenger_count,
        origin_address: None,
    }
}

/// Store a join request directly, bypassing the engine. Confirmed ones hold their seats.
pub async fn seed_join_request(
    storage: &Storage,
    offer: &Offer,
    requester: &str,
    passenger_count: u32,
    status: JoinStatus,
) -> Uuid {
    let now = Utc::now();
    let join_request = JoinRequest {
        id: Uuid::new_v4(),
        offer_id: offer.id,
        event_id: offer.event_id,
        requester_id: requester.to_string(),
        requester: ContactCard::from_identity(&passenger()),
        passenger_count,
        leg: LegKind::Going,
        pickup: Place::new("Home", HOME),
        projection: PickupProjection {
            snapped: HOME,
            segment_index: 0,
            offset_km: 0.0,
            along_route_km: 0.0,
            detour_km: 0.0,
            detour_secs: 0.0,
        },
        note: None,
        status: JoinStatus::Pending,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    };
    storage.join_requests.insert_join_request(&join_request).await.unwrap();

    if status == JoinStatus::Confirmed {
        assert!(storage.ledger.try_reserve(offer.id, passenger_count).await.unwrap());
    }
    if status != JoinStatus::Pending {
        storage
            .join_requests
            .transition(join_request.id, JoinStatus::Pending, status, None)
            .await
            .unwrap()
            .unwrap();
    }
    join_request.id
}

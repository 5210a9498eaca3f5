mod common;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

use common::*;

use ridepool_core::models::{JoinRequest, JoinStatus};
use ridepool_core::repository::JoinRequestRepository;
use ridepool_core::{CoreError, CoreResult};
use ridepool_offer::OfferRemoval;
use ridepool_store::memory::InMemoryStore;

/// Holds every insert until the test lets it through.
struct GatedJoinRequests {
    inner: Arc<InMemoryStore>,
    reached: Notify,
    release: Notify,
}

#[async_trait]
impl JoinRequestRepository for GatedJoinRequests {
    async fn insert_join_request(&self, join_request: &JoinRequest) -> CoreResult<()> {
        self.reached.notify_one();
        self.release.notified().await;
        self.inner.insert_join_request(join_request).await
    }

    async fn get_join_request(&self, id: Uuid) -> CoreResult<Option<JoinRequest>> {
        self.inner.get_join_request(id).await
    }

    async fn list_join_requests_by_offer(&self, offer_id: Uuid) -> CoreResult<Vec<JoinRequest>> {
        self.inner.list_join_requests_by_offer(offer_id).await
    }

    async fn list_join_requests_by_requester(&self, requester_id: &str) -> CoreResult<Vec<JoinRequest>> {
        self.inner.list_join_requests_by_requester(requester_id).await
    }

    async fn transition(
        &self,
        id: Uuid,
        from: JoinStatus,
        to: JoinStatus,
        reason: Option<String>,
    ) -> CoreResult<Option<JoinRequest>> {
        self.inner.transition(id, from, to, reason).await
    }

    async fn set_passenger_count(&self, id: Uuid, passenger_count: u32) -> CoreResult<Option<JoinRequest>> {
        self.inner.set_passenger_count(id, passenger_count).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_accepts_for_the_last_seats() {
    let world = World::new().await;
    let offer = world.offer(3).await;
    let (anna, bea) = (rider("anna"), rider("bea"));

    let a = world.engine.submit(&anna, offer.id, submission(&anna, 2)).await.unwrap();
    let b = world.engine.submit(&bea, offer.id, submission(&bea, 2)).await.unwrap();
    let (a_id, b_id) = (a.id, b.id);

    let first = tokio::spawn({
        let engine = world.engine.clone();
        async move { engine.accept("driver", a_id).await }
    });
    let second = tokio::spawn({
        let engine = world.engine.clone();
        async move { engine.accept("driver", b_id).await }
    });
    let results = vec![first.await.unwrap(), second.await.unwrap()];

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::CapacityExceeded { .. })))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(refused, 1);
    assert_eq!(world.confirmed(offer.id).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_accepts_never_overbook() {
    let world = World::new().await;
    let offer = world.offer(10).await;

    let mut ids = Vec::new();
    for i in 0..25 {
        let who = rider(&format!("rider-{}", i));
        ids.push(world.engine.submit(&who, offer.id, submission(&who, 1)).await.unwrap().id);
    }

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let engine = world.engine.clone();
            tokio::spawn(async move { engine.accept("driver", id).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 10);
    assert_eq!(world.available(offer.id).await, 0);

    let confirmed_passengers: u32 = world
        .engine
        .list_for_offer("driver", offer.id)
        .await
        .unwrap()
        .iter()
        .filter(|jr| jr.status == JoinStatus::Confirmed)
        .map(|jr| jr.passenger_count)
        .sum();
    assert_eq!(confirmed_passengers, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_release_once() {
    let world = World::new().await;
    let offer = world.offer(4).await;
    let anna = rider("anna");

    let jr = world.engine.submit(&anna, offer.id, submission(&anna, 3)).await.unwrap();
    world.engine.accept("driver", jr.id).await.unwrap();
    let jr_id = jr.id;

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let engine = world.engine.clone();
            let caller = if i % 2 == 0 { "driver" } else { "anna" };
            tokio::spawn(async move { engine.cancel(caller, jr_id, None).await })
        })
        .collect();
    for handle in handles {
        let cancelled = handle.await.unwrap().unwrap();
        assert_eq!(cancelled.status, JoinStatus::Cancelled);
    }

    assert_eq!(world.confirmed(offer.id).await, 0);
    assert_eq!(world.available(offer.id).await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_offer_removed_while_join_request_is_stored() {
    let repos = Arc::new(InMemoryStore::new());
    let gate = Arc::new(GatedJoinRequests {
        inner: repos.clone(),
        reached: Notify::new(),
        release: Notify::new(),
    });
    let world = World::with_join_requests(repos, gate.clone()).await;
    let offer = world.offer(2).await;
    let offer_id = offer.id;

    let submit = tokio::spawn({
        let engine = world.engine.clone();
        async move {
            let anna = rider("anna");
            engine.submit(&anna, offer_id, submission(&anna, 1)).await
        }
    });

    // The submission passed every check and is about to be stored
    gate.reached.notified().await;
    let removal = world.offers.delete_offer("driver", offer_id).await.unwrap();
    assert_eq!(removal, OfferRemoval::Removed);
    gate.release.notify_one();

    let err = submit.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let stored = world.engine.list_for_requester("anna").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, JoinStatus::Cancelled);
    assert_eq!(stored[0].cancel_reason.as_deref(), Some("offer withdrawn"));

    let again = world.engine.cancel("anna", stored[0].id, None).await.unwrap();
    assert_eq!(again.status, JoinStatus::Cancelled);
}

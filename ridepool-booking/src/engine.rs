use chrono::Utc;
use uuid::Uuid;

use ridepool_catalog::PickupProjector;
use ridepool_core::events::now_ts;
use ridepool_core::identity::Identity;
use ridepool_core::models::{JoinRequest, JoinStatus, Offer, RequestStatus};
use ridepool_core::routing::BoundedRouter;
use ridepool_core::{CoreError, CoreResult};
use ridepool_offer::cascade;
use ridepool_offer::rules;
use ridepool_offer::Storage;
use ridepool_shared::models::events::JoinRequestSubmittedEvent;
use ridepool_shared::DomainEvent;

use crate::submission::JoinSubmission;

/// Join request lifecycle.
///
/// ```text
/// pending ──accept──▶ confirmed ──cancel──▶ cancelled
///    │ └────reject──▶ rejected
///    └──────cancel──▶ cancelled
/// ```
///
/// Seats are held in the [`SeatLedger`](ridepool_catalog::SeatLedger) only while a join
/// request is confirmed. Accept reserves before it flips the status; cancel flips the
/// status before it releases.
pub struct JoinRequestEngine {
    storage: Storage,
    router: BoundedRouter,
    projector: PickupProjector,
}

impl JoinRequestEngine {
    pub fn new(storage: Storage, router: BoundedRouter, projector: PickupProjector) -> Self {
        Self {
            storage,
            router,
            projector,
        }
    }

    /// Ask for seats on an offer. Creates a `pending` join request.
    ///
    /// Seat availability is only checked here, not held: the reservation happens on accept.
    /// Every lookup runs before the insert, so a failed lookup stores nothing.
    pub async fn submit(
        &self,
        requester: &Identity,
        offer_id: Uuid,
        submission: JoinSubmission,
    ) -> CoreResult<JoinRequest> {
        rules::validate_passenger_count(submission.passenger_count)?;
        rules::validate_notes(submission.note.as_deref())?;
        submission.contact.validate()?;

        let offer = self.load_offer(offer_id).await?;
        ensure_active(&offer)?;
        self.storage
            .accessible_event(offer.event_id, Some(&requester.subject), submission.access_code.as_deref())
            .await?;

        if offer.is_owned_by(&requester.subject) {
            return Err(CoreError::Forbidden("drivers cannot join their own offer".to_string()));
        }
        if !offer.preference.admits(requester.gender) {
            return Err(CoreError::Forbidden(format!(
                "offer {} is limited by the driver's passenger preference",
                offer_id
            )));
        }
        let leg = offer.leg(submission.leg).ok_or_else(|| {
            CoreError::Validation(format!("offer {} has no {} leg", offer_id, submission.leg.as_str()))
        })?;

        let duplicate = self
            .storage
            .join_requests
            .list_join_requests_by_requester(&requester.subject)
            .await?
            .iter()
            .any(|jr| jr.offer_id == offer_id && jr.is_open());
        if duplicate {
            return Err(CoreError::DuplicateJoinRequest {
                offer_id,
                requester: requester.subject.clone(),
            });
        }

        let available = self.storage.ledger.snapshot(offer_id).await?.available();
        if submission.passenger_count > available {
            tracing::warn!(
                "Join request for {} seats on offer {} refused, {} available",
                submission.passenger_count,
                offer_id,
                available
            );
            return Err(CoreError::CapacityExceeded {
                requested: submission.passenger_count,
                available,
            });
        }

        let pickup = self.router.resolve(&submission.pickup).await?;
        let projection = self.projector.project(&leg.route.polyline, pickup.point)?;

        let now = Utc::now();
        let join_request = JoinRequest {
            id: Uuid::new_v4(),
            offer_id,
            event_id: offer.event_id,
            requester_id: requester.subject.clone(),
            requester: submission.contact,
            passenger_count: submission.passenger_count,
            leg: submission.leg,
            pickup,
            projection,
            note: submission.note.filter(|n| !n.trim().is_empty()),
            status: JoinStatus::Pending,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.join_requests.insert_join_request(&join_request).await?;

        // A withdrawal that started after the offer was loaded has already swept its join
        // requests, so this one is closed here instead.
        let still_active = self
            .storage
            .offers
            .get_offer(offer_id)
            .await?
            .is_some_and(|current| current.is_active());
        if !still_active {
            tracing::warn!("Offer {} was withdrawn while join request {} was stored", offer_id, join_request.id);
            cascade::cancel_join_request(&self.storage, join_request, Some(cascade::OFFER_WITHDRAWN.to_string()))
                .await?;
            return Err(CoreError::Validation(format!("offer {} is no longer active", offer_id)));
        }

        tracing::info!(
            "Join request {} submitted on offer {}: {} seat(s), detour {:.2} km",
            join_request.id,
            offer_id,
            join_request.passenger_count,
            projection.detour_km
        );
        self.storage.publish(DomainEvent::JoinRequestSubmitted(JoinRequestSubmittedEvent {
            join_request_id: join_request.id,
            offer_id,
            requester_id: join_request.requester_id.clone(),
            passenger_count: join_request.passenger_count,
            detour_km: projection.detour_km,
            timestamp: now_ts(),
        }));

        Ok(join_request)
    }

    /// Transition: Pending → Confirmed (seats reserved)
    pub async fn accept(&self, driver: &str, id: Uuid) -> CoreResult<JoinRequest> {
        let join_request = self.load(id).await?;
        let offer = self.load_offer(join_request.offer_id).await?;
        ensure_driver(&offer, driver)?;

        if join_request.status != JoinStatus::Pending {
            return Err(invalid(join_request.status, JoinStatus::Confirmed));
        }
        ensure_active(&offer)?;

        let count = join_request.passenger_count;
        if !self.storage.ledger.try_reserve(offer.id, count).await? {
            let available = self.storage.ledger.snapshot(offer.id).await?.available();
            tracing::warn!(
                "Cannot accept join request {}: {} seat(s) requested, {} available",
                id,
                count,
                available
            );
            return Err(CoreError::CapacityExceeded {
                requested: count,
                available,
            });
        }

        let confirmed = match self
            .storage
            .join_requests
            .transition(id, JoinStatus::Pending, JoinStatus::Confirmed, None)
            .await
        {
            Ok(Some(confirmed)) => confirmed,
            Ok(None) => {
                self.storage.ledger.release(offer.id, count).await?;
                let current = self.load(id).await?;
                tracing::warn!("Join request {} changed to {} while being accepted", id, current.status);
                return Err(invalid(current.status, JoinStatus::Confirmed));
            }
            Err(e) => {
                tracing::error!("Failed to confirm join request {}: {}", id, e);
                self.storage.ledger.release(offer.id, count).await?;
                return Err(e);
            }
        };

        cascade::set_request_status_for(
            &self.storage,
            confirmed.event_id,
            &confirmed.requester_id,
            RequestStatus::Active,
            RequestStatus::Matched,
        )
        .await?;

        let available = self.storage.ledger.snapshot(offer.id).await?.available();
        tracing::info!(
            "Join request {} confirmed on offer {}, {} seat(s) left",
            id,
            offer.id,
            available
        );
        self.storage
            .publish(cascade::status_event(&confirmed, JoinStatus::Pending, Some(available)));
        Ok(confirmed)
    }

    /// Transition: Pending → Rejected (no capacity effect)
    pub async fn reject(&self, driver: &str, id: Uuid) -> CoreResult<JoinRequest> {
        let join_request = self.load(id).await?;
        let offer = self.load_offer(join_request.offer_id).await?;
        ensure_driver(&offer, driver)?;

        match self
            .storage
            .join_requests
            .transition(id, JoinStatus::Pending, JoinStatus::Rejected, None)
            .await?
        {
            Some(rejected) => {
                tracing::info!("Join request {} rejected", id);
                self.storage
                    .publish(cascade::status_event(&rejected, JoinStatus::Pending, None));
                Ok(rejected)
            }
            None => {
                let current = self.load(id).await?;
                Err(invalid(current.status, JoinStatus::Rejected))
            }
        }
    }

    /// Transition: Pending | Confirmed → Cancelled. Either side may cancel.
    ///
    /// Cancelling an already closed join request changes nothing and returns it as stored.
    pub async fn cancel(&self, caller: &str, id: Uuid, reason: Option<String>) -> CoreResult<JoinRequest> {
        let join_request = self.load(id).await?;
        if join_request.requester_id != caller {
            // The offer is gone if it was removed while this join request was being stored.
            let driver_owns = self
                .storage
                .offers
                .get_offer(join_request.offer_id)
                .await?
                .is_some_and(|offer| offer.is_owned_by(caller));
            if !driver_owns {
                return Err(CoreError::Forbidden(format!(
                    "join request {} is not yours to cancel",
                    id
                )));
            }
        }

        if join_request.status.is_terminal() {
            tracing::debug!("Join request {} already {}, nothing to cancel", id, join_request.status);
            return Ok(join_request);
        }

        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        match cascade::cancel_join_request(&self.storage, join_request, reason).await? {
            Some(cancelled) => Ok(cancelled),
            None => self.load(id).await,
        }
    }

    /// Change the seat count of a pending join request, e.g. after a capacity refusal.
    pub async fn update_passenger_count(
        &self,
        requester: &str,
        id: Uuid,
        passenger_count: u32,
    ) -> CoreResult<JoinRequest> {
        rules::validate_passenger_count(passenger_count)?;
        let join_request = self.load(id).await?;
        if join_request.requester_id != requester {
            return Err(CoreError::Forbidden(format!("join request {} belongs to someone else", id)));
        }
        if join_request.status != JoinStatus::Pending {
            return Err(invalid(join_request.status, JoinStatus::Pending));
        }

        let available = self.storage.ledger.snapshot(join_request.offer_id).await?.available();
        if passenger_count > available {
            return Err(CoreError::CapacityExceeded {
                requested: passenger_count,
                available,
            });
        }

        match self
            .storage
            .join_requests
            .set_passenger_count(id, passenger_count)
            .await?
        {
            Some(updated) => {
                tracing::info!("Join request {} now asks for {} seat(s)", id, passenger_count);
                Ok(updated)
            }
            None => {
                let current = self.load(id).await?;
                Err(invalid(current.status, JoinStatus::Pending))
            }
        }
    }

    /// Visible to the driver and the requester only.
    pub async fn get(&self, caller: &str, id: Uuid) -> CoreResult<JoinRequest> {
        let join_request = self.load(id).await?;
        if join_request.requester_id == caller {
            return Ok(join_request);
        }
        let offer = self.load_offer(join_request.offer_id).await?;
        ensure_driver(&offer, caller)?;
        Ok(join_request)
    }

    pub async fn list_for_offer(&self, driver: &str, offer_id: Uuid) -> CoreResult<Vec<JoinRequest>> {
        let offer = self.load_offer(offer_id).await?;
        ensure_driver(&offer, driver)?;
        self.storage.join_requests.list_join_requests_by_offer(offer_id).await
    }

    pub async fn list_for_requester(&self, requester: &str) -> CoreResult<Vec<JoinRequest>> {
        self.storage
            .join_requests
            .list_join_requests_by_requester(requester)
            .await
    }

    async fn load(&self, id: Uuid) -> CoreResult<JoinRequest> {
        self.storage
            .join_requests
            .get_join_request(id)
            .await?
            .ok_or_else(|| CoreError::not_found("join request", id))
    }

    async fn load_offer(&self, id: Uuid) -> CoreResult<Offer> {
        self.storage
            .offers
            .get_offer(id)
            .await?
            .ok_or_else(|| CoreError::not_found("offer", id))
    }
}

fn ensure_driver(offer: &Offer, caller: &str) -> CoreResult<()> {
    if offer.is_owned_by(caller) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("only the driver of offer {} can do this", offer.id)))
    }
}

fn ensure_active(offer: &Offer) -> CoreResult<()> {
    if offer.is_active() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("offer {} is no longer active", offer.id)))
    }
}

fn invalid(from: JoinStatus, to: JoinStatus) -> CoreError {
    CoreError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

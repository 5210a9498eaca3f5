use uuid::Uuid;

use ridepool_core::events::now_ts;
use ridepool_core::models::{JoinRequest, JoinStatus, Offer, OfferStatus, RequestStatus};
use ridepool_core::CoreResult;
use ridepool_shared::models::events::{JoinRequestStatusEvent, OfferWithdrawnEvent};
use ridepool_shared::DomainEvent;

use crate::storage::Storage;

pub const OFFER_WITHDRAWN: &str = "offer withdrawn";
pub const EVENT_CANCELLED: &str = "event cancelled";

pub fn status_event(
    join_request: &JoinRequest,
    from: JoinStatus,
    seats_available: Option<u32>,
) -> DomainEvent {
    DomainEvent::JoinRequestStatusChanged(JoinRequestStatusEvent {
        join_request_id: join_request.id,
        offer_id: join_request.offer_id,
        requester_id: join_request.requester_id.clone(),
        from: from.to_string(),
        to: join_request.status.to_string(),
        reason: join_request.cancel_reason.clone(),
        seats_available,
        timestamp: now_ts(),
    })
}

/// Cancel every non-terminal join request on an offer. Confirmed ones give their seats
/// back. Returns how many were closed by this call.
pub async fn close_open_join_requests(storage: &Storage, offer_id: Uuid, reason: &str) -> CoreResult<usize> {
    let mut closed = 0;

    for join_request in storage.join_requests.list_join_requests_by_offer(offer_id).await? {
        if !join_request.is_open() {
            continue;
        }
        if cancel_join_request(storage, join_request, Some(reason.to_string())).await?.is_some() {
            closed += 1;
        }
    }

    Ok(closed)
}

/// Soft-delete: the offer is marked cancelled first so no new accept can start, then its
/// open join requests are closed.
pub async fn withdraw_offer(storage: &Storage, mut offer: Offer, reason: &str) -> CoreResult<usize> {
    if offer.status != OfferStatus::Cancelled {
        offer.status = OfferStatus::Cancelled;
        offer.touch();
        storage.offers.update_offer(&offer).await?;
    }

    let closed = close_open_join_requests(storage, offer.id, reason).await?;
    tracing::info!("Offer {} withdrawn, {} join requests closed", offer.id, closed);

    storage.publish(DomainEvent::OfferWithdrawn(OfferWithdrawnEvent {
        offer_id: offer.id,
        event_id: offer.event_id,
        closed_join_requests: closed,
        timestamp: now_ts(),
    }));
    Ok(closed)
}

/// Move a join request to cancelled, releasing its seats if it held any. Returns `None`
/// when it was already terminal, in which case nothing is released.
///
/// A concurrent accept can move the record from pending to confirmed between the read
/// and the compare-and-set, so a lost race re-reads and tries again.
pub async fn cancel_join_request(
    storage: &Storage,
    mut current: JoinRequest,
    reason: Option<String>,
) -> CoreResult<Option<JoinRequest>> {
    loop {
        if current.status.is_terminal() {
            return Ok(None);
        }

        let from = current.status;
        let updated = storage
            .join_requests
            .transition(current.id, from, JoinStatus::Cancelled, reason.clone())
            .await?;

        match updated {
            Some(cancelled) => {
                let mut seats_available = None;
                if from == JoinStatus::Confirmed {
                    storage.ledger.release(cancelled.offer_id, cancelled.passenger_count).await?;
                    seats_available = Some(storage.ledger.snapshot(cancelled.offer_id).await?.available());
                    release_match(storage, cancelled.event_id, &cancelled.requester_id).await?;
                }
                tracing::info!(
                    "Join request {} cancelled (was {}), reason: {}",
                    cancelled.id,
                    from,
                    reason.as_deref().unwrap_or("none given")
                );
                storage.publish(status_event(&cancelled, from, seats_available));
                return Ok(Some(cancelled));
            }
            None => match storage.join_requests.get_join_request(current.id).await? {
                Some(fresh) => current = fresh,
                None => return Ok(None),
            },
        }
    }
}

/// Move the requester's open request for the event from `from` to `to`, if there is one.
pub async fn set_request_status_for(
    storage: &Storage,
    event_id: Uuid,
    requester_id: &str,
    from: RequestStatus,
    to: RequestStatus,
) -> CoreResult<usize> {
    let mut changed = 0;
    for mut request in storage.requests.list_requests_by_owner(requester_id).await? {
        if request.event_id != event_id || request.status != from {
            continue;
        }
        request.update_status(to.clone());
        storage.requests.update_request(&request).await?;
        changed += 1;
    }
    Ok(changed)
}

/// A matched request goes back to active once the requester holds no confirmed seat
/// for the event anymore.
pub async fn release_match(storage: &Storage, event_id: Uuid, requester_id: &str) -> CoreResult<()> {
    let still_riding = storage
        .join_requests
        .list_join_requests_by_requester(requester_id)
        .await?
        .iter()
        .any(|jr| jr.event_id == event_id && jr.status == JoinStatus::Confirmed);

    if !still_riding {
        let reverted =
            set_request_status_for(storage, event_id, requester_id, RequestStatus::Matched, RequestStatus::Active)
                .await?;
        if reverted > 0 {
            tracing::debug!("Request of {} for event {} is looking for a ride again", requester_id, event_id);
        }
    }
    Ok(())
}

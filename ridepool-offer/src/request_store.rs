use chrono::Utc;
use uuid::Uuid;

use ridepool_core::identity::Identity;
use ridepool_core::models::{Offer, OfferView, RequestStatus, RideRequest};
use ridepool_core::{CoreError, CoreResult};

use crate::drafts::{RequestDraft, RequestPatch};
use crate::offer_store::offer_view;
use crate::rules;
use crate::storage::Storage;

/// Passengers' ride requests for an event.
#[derive(Clone)]
pub struct RequestStore {
    storage: Storage,
}

impl RequestStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn create_request(&self, owner: &Identity, draft: RequestDraft) -> CoreResult<RideRequest> {
        rules::validate_request_draft(&draft)?;
        let event = self
            .storage
            .accessible_event(draft.base.event_id, Some(&owner.subject), draft.base.access_code.as_deref())
            .await?;

        let now = Utc::now();
        let request = RideRequest {
            id: Uuid::new_v4(),
            event_id: event.id,
            owner_id: owner.subject.clone(),
            passenger: draft.base.contact,
            passenger_gender: owner.gender,
            trip_type: draft.trip_type,
            passenger_count: draft.passenger_count,
            preference: draft.base.preference,
            origin_address: draft.origin_address.filter(|a| !a.trim().is_empty()),
            notes: draft.base.notes.filter(|n| !n.trim().is_empty()),
            status: RequestStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.storage.requests.insert_request(&request).await?;
        tracing::info!(
            "Request {} for {} passenger(s) posted on event {}",
            request.id,
            request.passenger_count,
            request.event_id
        );
        Ok(request)
    }

    pub async fn update_request(&self, caller: &str, id: Uuid, patch: RequestPatch) -> CoreResult<RideRequest> {
        let mut request = self.owned(caller, id).await?;
        if request.status == RequestStatus::Cancelled {
            return Err(CoreError::InvalidTransition {
                from: "cancelled".to_string(),
                to: "updated".to_string(),
            });
        }

        if let Some(passenger_count) = patch.passenger_count {
            rules::validate_passenger_count(passenger_count)?;
            request.passenger_count = passenger_count;
        }
        if let Some(trip_type) = patch.trip_type {
            request.trip_type = trip_type;
        }
        if let Some(preference) = patch.preference {
            request.preference = preference;
        }
        if let Some(visibility) = patch.visibility {
            request.passenger.visibility = visibility;
        }
        if let Some(notes) = patch.notes {
            rules::validate_notes(Some(&notes))?;
            request.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        if let Some(origin_address) = patch.origin_address {
            request.origin_address = Some(origin_address).filter(|a| !a.trim().is_empty());
        }

        request.updated_at = Utc::now();
        self.storage.requests.update_request(&request).await?;
        tracing::info!("Request {} updated", id);
        Ok(request)
    }

    /// Requests are never removed, only cancelled.
    pub async fn delete_request(&self, caller: &str, id: Uuid) -> CoreResult<RideRequest> {
        let mut request = self.owned(caller, id).await?;
        if request.status != RequestStatus::Cancelled {
            request.update_status(RequestStatus::Cancelled);
            self.storage.requests.update_request(&request).await?;
            tracing::info!("Request {} cancelled", id);
        }
        Ok(request)
    }

    pub async fn get_request(
        &self,
        id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<RideRequest> {
        let request = self.visible(id, viewer, access_code).await?;
        Ok(present(request, viewer))
    }

    /// Requests of an event still looking for a ride.
    pub async fn list_by_event(
        &self,
        event_id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<Vec<RideRequest>> {
        self.storage.accessible_event(event_id, viewer, access_code).await?;

        Ok(self
            .storage
            .requests
            .list_requests_by_event(event_id)
            .await?
            .into_iter()
            .filter(|r| r.status == RequestStatus::Active)
            .map(|r| present(r, viewer))
            .collect())
    }

    pub async fn list_owned(&self, owner: &str) -> CoreResult<Vec<RideRequest>> {
        self.storage.requests.list_requests_by_owner(owner).await
    }

    /// Active offers on the same event that could take this request as it stands.
    pub async fn find_matches(
        &self,
        request_id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<Vec<OfferView>> {
        let request = self.visible(request_id, viewer, access_code).await?;
        if request.status == RequestStatus::Cancelled {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for offer in self.storage.offers.list_offers_by_event(request.event_id).await? {
            if !is_candidate(&offer, &request) {
                continue;
            }
            let view = offer_view(&self.storage, offer, viewer).await?;
            if view.available_seats >= request.passenger_count {
                matches.push(view);
            }
        }

        tracing::debug!("Request {} has {} matching offers", request_id, matches.len());
        Ok(matches)
    }

    async fn load(&self, id: Uuid) -> CoreResult<RideRequest> {
        self.storage
            .requests
            .get_request(id)
            .await?
            .ok_or_else(|| CoreError::not_found("request", id))
    }

    /// Requests on a private event need its access code unless the viewer posted them.
    async fn visible(&self, id: Uuid, viewer: Option<&str>, access_code: Option<&str>) -> CoreResult<RideRequest> {
        let request = self.load(id).await?;
        if !viewer.is_some_and(|v| request.is_owned_by(v)) {
            self.storage
                .ensure_event_visible(request.event_id, viewer, access_code)
                .await?;
        }
        Ok(request)
    }

    async fn owned(&self, caller: &str, id: Uuid) -> CoreResult<RideRequest> {
        let request = self.load(id).await?;
        if !request.is_owned_by(caller) {
            return Err(CoreError::Forbidden(format!("request {} belongs to someone else", id)));
        }
        Ok(request)
    }
}

/// Same event, both preference filters satisfied, and every leg the passenger needs is driven.
fn is_candidate(offer: &Offer, request: &RideRequest) -> bool {
    offer.is_active()
        && offer.event_id == request.event_id
        && !offer.is_owned_by(&request.owner_id)
        && request.trip_type.legs().into_iter().all(|kind| offer.leg(kind).is_some())
        && offer.preference.admits(request.passenger_gender)
        && request.preference.admits(offer.driver_gender)
}

fn present(mut request: RideRequest, viewer: Option<&str>) -> RideRequest {
    if !viewer.is_some_and(|v| request.is_owned_by(v)) {
        request.passenger = request.passenger.redacted();
    }
    request
}

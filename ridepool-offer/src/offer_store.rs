use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_catalog::{PriceCapCalculator, SeatSnapshot};
use ridepool_core::events::now_ts;
use ridepool_core::identity::Identity;
use ridepool_core::models::{LegKind, Offer, OfferStatus, OfferView, RouteLeg};
use ridepool_core::routing::BoundedRouter;
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::models::events::OfferPublishedEvent;
use ridepool_shared::DomainEvent;

use crate::cascade::{self, OFFER_WITHDRAWN};
use crate::drafts::{OfferDraft, OfferPatch};
use crate::rules;
use crate::storage::Storage;

/// What `delete_offer` did with the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OfferRemoval {
    /// Nothing referenced it, so it is gone.
    Removed,
    /// Kept for history and marked cancelled.
    Cancelled { closed_join_requests: usize },
}

/// Drivers' seat offers for an event.
#[derive(Clone)]
pub struct OfferStore {
    storage: Storage,
    router: BoundedRouter,
    pricing: PriceCapCalculator,
}

impl OfferStore {
    pub fn new(storage: Storage, router: BoundedRouter, pricing: PriceCapCalculator) -> Self {
        Self {
            storage,
            router,
            pricing,
        }
    }

    pub fn pricing(&self) -> &PriceCapCalculator {
        &self.pricing
    }

    /// Publish an offer. Every leg is routed before anything is stored, so a failed
    /// lookup leaves no trace.
    pub async fn create_offer(&self, owner: &Identity, draft: OfferDraft) -> CoreResult<OfferView> {
        rules::validate_offer_draft(&draft)?;
        let event = self
            .storage
            .accessible_event(draft.base.event_id, Some(&owner.subject), draft.base.access_code.as_deref())
            .await?;

        let mut legs = Vec::with_capacity(draft.legs.len());
        for leg in &draft.legs {
            let endpoint = self.router.resolve(&leg.endpoint).await?;
            let (origin, destination) = match leg.kind {
                LegKind::Going => (endpoint.point, event.destination.point),
                LegKind::Return => (event.destination.point, endpoint.point),
            };
            let route = self.router.route(origin, destination).await?;
            tracing::debug!(
                "Routed {} leg of new offer: {:.1} km, {} points",
                leg.kind.as_str(),
                route.distance_km,
                route.polyline.len()
            );
            legs.push(RouteLeg {
                kind: leg.kind,
                endpoint,
                departs_at: leg.departs_at,
                route,
            });
        }

        let now = Utc::now();
        let offer = Offer {
            id: Uuid::new_v4(),
            event_id: event.id,
            owner_id: owner.subject.clone(),
            driver: draft.base.contact,
            driver_gender: owner.gender,
            total_seats: draft.total_seats,
            legs,
            preference: draft.base.preference,
            payment: draft.payment,
            notes: normalize(draft.base.notes),
            status: OfferStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.pricing.validate_policy(&offer.payment, offer.one_way_distance_km())?;

        self.storage.ledger.register(offer.id, offer.total_seats).await?;
        if let Err(e) = self.storage.offers.insert_offer(&offer).await {
            tracing::error!("Failed to store offer {}: {}", offer.id, e);
            self.storage.ledger.forget(offer.id).await?;
            return Err(e);
        }

        tracing::info!(
            "Offer {} published on event {} with {} seats",
            offer.id,
            offer.event_id,
            offer.total_seats
        );
        self.storage.publish(DomainEvent::OfferPublished(OfferPublishedEvent {
            offer_id: offer.id,
            event_id: offer.event_id,
            total_seats: offer.total_seats,
            timestamp: now_ts(),
        }));

        self.view(offer, Some(&owner.subject)).await
    }

    pub async fn update_offer(&self, caller: &str, id: Uuid, patch: OfferPatch) -> CoreResult<OfferView> {
        let mut offer = self.owned(caller, id).await?;
        if !offer.is_active() {
            return Err(CoreError::InvalidTransition {
                from: offer.status.to_string(),
                to: "updated".to_string(),
            });
        }

        if let Some(payment) = patch.payment {
            self.pricing.validate_policy(&payment, offer.one_way_distance_km())?;
            offer.payment = payment;
        }
        if let Some(notes) = patch.notes {
            rules::validate_notes(Some(&notes))?;
            offer.notes = normalize(Some(notes));
        }
        if let Some(preference) = patch.preference {
            offer.preference = preference;
        }
        if let Some(visibility) = patch.visibility {
            offer.driver.visibility = visibility;
        }

        let previous_total = offer.total_seats;
        if let Some(total_seats) = patch.total_seats {
            rules::validate_seats(total_seats)?;
            if !self.storage.ledger.resize(id, total_seats).await? {
                let snapshot = self.storage.ledger.snapshot(id).await?;
                tracing::warn!(
                    "Refused to shrink offer {} to {} seats with {} confirmed",
                    id,
                    total_seats,
                    snapshot.confirmed
                );
                return Err(CoreError::CapacityExceeded {
                    requested: snapshot.confirmed,
                    available: total_seats,
                });
            }
            offer.total_seats = total_seats;
        }

        offer.touch();
        if let Err(e) = self.storage.offers.update_offer(&offer).await {
            if offer.total_seats != previous_total {
                self.storage.ledger.resize(id, previous_total).await?;
            }
            return Err(e);
        }

        tracing::info!("Offer {} updated", id);
        self.view(offer, Some(caller)).await
    }

    /// Withdraw an offer. It is marked cancelled before anything else, so no join request
    /// can be submitted or accepted from then on, and every open one is let go. The record
    /// is removed outright only when no join request ever referenced it.
    pub async fn delete_offer(&self, caller: &str, id: Uuid) -> CoreResult<OfferRemoval> {
        let offer = self.owned(caller, id).await?;
        let closed = cascade::withdraw_offer(&self.storage, offer, OFFER_WITHDRAWN).await?;

        let referenced = !self
            .storage
            .join_requests
            .list_join_requests_by_offer(id)
            .await?
            .is_empty();
        if referenced {
            return Ok(OfferRemoval::Cancelled {
                closed_join_requests: closed,
            });
        }

        self.storage.offers.remove_offer(id).await?;
        self.storage.ledger.forget(id).await?;
        tracing::info!("Offer {} removed", id);
        Ok(OfferRemoval::Removed)
    }

    /// Offers on a private event need its access code unless the viewer drives them.
    pub async fn get_offer(&self, id: Uuid, viewer: Option<&str>, access_code: Option<&str>) -> CoreResult<OfferView> {
        let offer = self.load(id).await?;
        if !viewer.is_some_and(|v| offer.is_owned_by(v)) {
            self.storage.ensure_event_visible(offer.event_id, viewer, access_code).await?;
        }
        self.view(offer, viewer).await
    }

    /// Active offers of an event, with seat counts.
    pub async fn list_by_event(
        &self,
        event_id: Uuid,
        viewer: Option<&str>,
        access_code: Option<&str>,
    ) -> CoreResult<Vec<OfferView>> {
        self.storage.accessible_event(event_id, viewer, access_code).await?;

        let mut views = Vec::new();
        for offer in self.storage.offers.list_offers_by_event(event_id).await? {
            if offer.is_active() {
                views.push(self.view(offer, viewer).await?);
            }
        }
        Ok(views)
    }

    /// Every offer the caller has published, including withdrawn ones.
    pub async fn list_owned(&self, owner: &str) -> CoreResult<Vec<OfferView>> {
        let mut views = Vec::new();
        for offer in self.storage.offers.list_offers_by_owner(owner).await? {
            views.push(self.view(offer, Some(owner)).await?);
        }
        Ok(views)
    }

    async fn load(&self, id: Uuid) -> CoreResult<Offer> {
        self.storage
            .offers
            .get_offer(id)
            .await?
            .ok_or_else(|| CoreError::not_found("offer", id))
    }

    async fn owned(&self, caller: &str, id: Uuid) -> CoreResult<Offer> {
        let offer = self.load(id).await?;
        if !offer.is_owned_by(caller) {
            return Err(CoreError::Forbidden(format!("offer {} belongs to someone else", id)));
        }
        Ok(offer)
    }

    pub async fn view(&self, offer: Offer, viewer: Option<&str>) -> CoreResult<OfferView> {
        offer_view(&self.storage, offer, viewer).await
    }
}

/// Attach seat counts and hide contact fields the driver chose not to share.
pub async fn offer_view(storage: &Storage, mut offer: Offer, viewer: Option<&str>) -> CoreResult<OfferView> {
    let snapshot = match storage.ledger.snapshot(offer.id).await {
        Ok(snapshot) => snapshot,
        Err(CoreError::NotFound(_)) => {
            tracing::warn!("No seat ledger entry for offer {}", offer.id);
            SeatSnapshot {
                total: offer.total_seats,
                confirmed: 0,
            }
        }
        Err(e) => return Err(e),
    };

    if !viewer.is_some_and(|v| offer.is_owned_by(v)) {
        offer.driver = offer.driver.redacted();
    }

    let available_seats = if offer.is_active() { snapshot.available() } else { 0 };
    Ok(OfferView {
        offer,
        confirmed_seats: snapshot.confirmed,
        available_seats,
    })
}

fn normalize(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

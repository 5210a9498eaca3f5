use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_core::geo::PlaceQuery;
use ridepool_core::models::{
    ContactCard, ContactVisibility, LegKind, PaymentPolicy, Preference, TripType,
};

/// Fields every listing carries, whichever side of the ride it is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingBase {
    pub event_id: Uuid,
    /// Needed to post on a private event.
    #[serde(default)]
    pub access_code: Option<String>,
    /// Contact details to publish with the listing. Remembered profile data is passed in
    /// here by the caller; the core never reads it from anywhere else.
    pub contact: ContactCard,
    #[serde(default)]
    pub preference: Preference,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegDraft {
    pub kind: LegKind,
    /// The driver's side of this leg (start when going, end when returning).
    pub endpoint: PlaceQuery,
    #[serde(default)]
    pub departs_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDraft {
    #[serde(flatten)]
    pub base: ListingBase,
    pub total_seats: u32,
    pub legs: Vec<LegDraft>,
    #[serde(default)]
    pub payment: PaymentPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDraft {
    #[serde(flatten)]
    pub base: ListingBase,
    pub trip_type: TripType,
    pub passenger_count: u32,
    #[serde(default)]
    pub origin_address: Option<String>,
}

/// Exactly one of the two listing shapes, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingDraft {
    Offer(OfferDraft),
    Request(RequestDraft),
}

impl ListingDraft {
    pub fn base(&self) -> &ListingBase {
        match self {
            ListingDraft::Offer(draft) => &draft.base,
            ListingDraft::Request(draft) => &draft.base,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferPatch {
    pub total_seats: Option<u32>,
    pub notes: Option<String>,
    pub preference: Option<Preference>,
    pub visibility: Option<ContactVisibility>,
    pub payment: Option<PaymentPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPatch {
    pub passenger_count: Option<u32>,
    pub trip_type: Option<TripType>,
    pub preference: Option<Preference>,
    pub visibility: Option<ContactVisibility>,
    pub notes: Option<String>,
    pub origin_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub destination: PlaceQuery,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub destination: Option<PlaceQuery>,
    pub is_private: Option<bool>,
    pub access_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_draft_is_tagged() {
        let json = serde_json::json!({
            "kind": "offer",
            "event_id": Uuid::nil(),
            "contact": { "name": "Kasia", "phone": "+48 600 000 000", "email": null },
            "total_seats": 3,
            "legs": [
                { "kind": "going", "endpoint": { "address": "Rynek 1", "point": { "lat": 50.06, "lng": 19.94 } } }
            ]
        });

        let draft: ListingDraft = serde_json::from_value(json).unwrap();
        match &draft {
            ListingDraft::Offer(offer) => {
                assert_eq!(offer.total_seats, 3);
                assert_eq!(offer.legs[0].kind, LegKind::Going);
                assert!(offer.payment.is_free());
                assert_eq!(offer.base.preference, Preference::Any);
            }
            ListingDraft::Request(_) => panic!("expected an offer"),
        }
        assert_eq!(draft.base().contact.name, "Kasia");
    }

    #[test]
    fn test_request_draft_requires_its_own_fields() {
        let missing_count = serde_json::json!({
            "kind": "request",
            "event_id": Uuid::nil(),
            "contact": { "name": "Piotr", "email": "piotr@example.com" },
            "trip_type": "both"
        });
        assert!(serde_json::from_value::<ListingDraft>(missing_count).is_err());

        let complete = serde_json::json!({
            "kind": "request",
            "event_id": Uuid::nil(),
            "contact": { "name": "Piotr", "email": "piotr@example.com" },
            "trip_type": "both",
            "passenger_count": 2
        });
        let draft: ListingDraft = serde_json::from_value(complete).unwrap();
        assert!(matches!(draft, ListingDraft::Request(ref r) if r.passenger_count == 2));
    }
}

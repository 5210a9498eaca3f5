use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::geo::Place;
use crate::models::listing::{ContactCard, Gender, LegKind, Preference};
use crate::models::payment::PaymentPolicy;
use crate::routing::RouteSummary;

/// Offer status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Active,
    Cancelled,
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Active => write!(f, "active"),
            OfferStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OfferStatus::Active),
            "cancelled" => Ok(OfferStatus::Cancelled),
            other => Err(format!("unknown offer status: {}", other)),
        }
    }
}

/// One direction of a driver's trip.
///
/// `endpoint` is the driver's side of the trip: the start of a going leg, the end of a
/// return leg. The other end is always the event destination. `route.polyline` is
/// ordered in travel direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub kind: LegKind,
    pub endpoint: Place,
    pub departs_at: Option<DateTime<Utc>>,
    pub route: RouteSummary,
}

/// A driver's advertisement of seats for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub event_id: Uuid,
    pub owner_id: String,
    pub driver: ContactCard,
    pub driver_gender: Option<Gender>,
    pub total_seats: u32,
    pub legs: Vec<RouteLeg>,
    pub preference: Preference,
    pub payment: PaymentPolicy,
    pub notes: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner_id == subject
    }

    pub fn leg(&self, kind: LegKind) -> Option<&RouteLeg> {
        self.legs.iter().find(|l| l.kind == kind)
    }

    /// The distance the price cap is derived from: going leg first, return leg otherwise.
    pub fn one_way_distance_km(&self) -> f64 {
        self.leg(LegKind::Going)
            .or_else(|| self.leg(LegKind::Return))
            .map(|l| l.route.distance_km)
            .unwrap_or(0.0)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An offer as listed to attendees, annotated with live seat counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub confirmed_seats: u32,
    pub available_seats: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn leg(kind: LegKind, km: f64) -> RouteLeg {
        RouteLeg {
            kind,
            endpoint: Place::new("Home", GeoPoint::new(50.0, 19.0)),
            departs_at: None,
            route: RouteSummary {
                distance_km: km,
                duration_secs: km * 60.0,
                polyline: vec![GeoPoint::new(50.0, 19.0), GeoPoint::new(50.1, 19.0)],
            },
        }
    }

    #[test]
    fn test_one_way_distance_prefers_going_leg() {
        let now = Utc::now();
        let mut offer = Offer {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            owner_id: "driver".to_string(),
            driver: ContactCard {
                name: "D".to_string(),
                phone: None,
                email: None,
                visibility: Default::default(),
            },
            driver_gender: None,
            total_seats: 3,
            legs: vec![leg(LegKind::Return, 12.0), leg(LegKind::Going, 10.0)],
            preference: Preference::Any,
            payment: PaymentPolicy::free(),
            notes: None,
            status: OfferStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(offer.one_way_distance_km(), 10.0);

        offer.legs.retain(|l| l.kind == LegKind::Return);
        assert_eq!(offer.one_way_distance_km(), 12.0);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!("cancelled".parse::<OfferStatus>().unwrap(), OfferStatus::Cancelled);
        assert_eq!(OfferStatus::Active.to_string(), "active");
        assert!("gone".parse::<OfferStatus>().is_err());
    }
}

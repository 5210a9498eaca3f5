use serde::{Deserialize, Serialize};

use ridepool_core::geo::PlaceQuery;
use ridepool_core::models::{ContactCard, LegKind};

/// A passenger's ask to ride on a specific offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSubmission {
    pub passenger_count: u32,
    pub leg: LegKind,
    /// Coordinates picked on the map, or an address to geocode.
    pub pickup: PlaceQuery,
    pub contact: ContactCard,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PassengerCountPatch {
    pub passenger_count: u32,
}

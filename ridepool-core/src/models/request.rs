use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::models::listing::{ContactCard, Gender, Preference, TripType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
    Matched,
    Cancelled,
}

/// A passenger's advertisement of need for a ride
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub event_id: Uuid,
    pub owner_id: String,
    pub passenger: ContactCard,
    pub passenger_gender: Option<Gender>,
    pub trip_type: TripType,
    pub passenger_count: u32,
    pub preference: Preference,
    pub origin_address: Option<String>,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn is_open(&self) -> bool {
        self.status != RequestStatus::Cancelled
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner_id == subject
    }

    pub fn update_status(&mut self, status: RequestStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

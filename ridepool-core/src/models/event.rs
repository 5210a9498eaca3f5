use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::geo::Place;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Deleted,
}

/// The time-boxed gathering every ride points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: String,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub destination: Place,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        organizer_id: String,
        name: String,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
        destination: Place,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organizer_id,
            name,
            starts_at,
            ends_at,
            destination,
            is_private: false,
            access_code: None,
            status: EventStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    pub fn is_organized_by(&self, subject: &str) -> bool {
        self.organizer_id == subject
    }

    /// Public events admit everyone; private ones need the matching code.
    pub fn admits(&self, access_code: Option<&str>) -> bool {
        if !self.is_private {
            return true;
        }
        match (&self.access_code, access_code) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }

    /// What non-organizers get to see.
    pub fn public_view(&self) -> Self {
        Self {
            access_code: None,
            ..self.clone()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

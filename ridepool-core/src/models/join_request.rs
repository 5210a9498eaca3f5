use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::geo::{GeoPoint, Place};
use crate::models::listing::{ContactCard, LegKind};

/// JoinRequest lifecycle. Rejected and cancelled are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl JoinStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JoinStatus::Rejected | JoinStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStatus::Pending => "pending",
            JoinStatus::Confirmed => "confirmed",
            JoinStatus::Rejected => "rejected",
            JoinStatus::Cancelled => "cancelled",
        }
    }

    /// Edges of the state machine.
    pub fn can_transition_to(&self, next: JoinStatus) -> bool {
        matches!(
            (self, next),
            (JoinStatus::Pending, JoinStatus::Confirmed)
                | (JoinStatus::Pending, JoinStatus::Rejected)
                | (JoinStatus::Pending, JoinStatus::Cancelled)
                | (JoinStatus::Confirmed, JoinStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JoinStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JoinStatus::Pending),
            "confirmed" => Ok(JoinStatus::Confirmed),
            "rejected" => Ok(JoinStatus::Rejected),
            "cancelled" => Ok(JoinStatus::Cancelled),
            other => Err(format!("unknown join request status: {}", other)),
        }
    }
}

/// Where a pickup lands on the driver's route and what it costs the driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PickupProjection {
    /// Nearest point on the route polyline.
    pub snapped: GeoPoint,
    /// Index of the polyline segment the snapped point lies on.
    pub segment_index: usize,
    /// Straight-line distance from the chosen point to the route.
    pub offset_km: f64,
    /// Distance travelled along the route before reaching the snapped point.
    pub along_route_km: f64,
    /// Extra one-way distance: out to the pickup and back onto the route.
    pub detour_km: f64,
    pub detour_secs: f64,
}

/// A specific passenger's ask to fill seats on a specific offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub event_id: Uuid,
    pub requester_id: String,
    pub requester: ContactCard,
    pub passenger_count: u32,
    pub leg: LegKind,
    pub pickup: Place,
    pub projection: PickupProjection,
    pub note: Option<String>,
    pub status: JoinStatus,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JoinRequest {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn update_status(&mut self, status: JoinStatus, reason: Option<String>) {
        self.status = status;
        if reason.is_some() {
            self.cancel_reason = reason;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_edges() {
        assert!(JoinStatus::Pending.can_transition_to(JoinStatus::Confirmed));
        assert!(JoinStatus::Pending.can_transition_to(JoinStatus::Rejected));
        assert!(JoinStatus::Confirmed.can_transition_to(JoinStatus::Cancelled));

        assert!(!JoinStatus::Confirmed.can_transition_to(JoinStatus::Rejected));
        assert!(!JoinStatus::Rejected.can_transition_to(JoinStatus::Confirmed));
        assert!(!JoinStatus::Cancelled.can_transition_to(JoinStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JoinStatus::Pending.is_terminal());
        assert!(!JoinStatus::Confirmed.is_terminal());
        assert!(JoinStatus::Rejected.is_terminal());
        assert!(JoinStatus::Cancelled.is_terminal());
    }
}

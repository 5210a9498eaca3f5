use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OfferPublishedEvent {
    pub offer_id: Uuid,
    pub event_id: Uuid,
    pub total_seats: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OfferWithdrawnEvent {
    pub offer_id: Uuid,
    pub event_id: Uuid,
    pub closed_join_requests: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct JoinRequestSubmittedEvent {
    pub join_request_id: Uuid,
    pub offer_id: Uuid,
    pub requester_id: String,
    pub passenger_count: u32,
    pub detour_km: f64,
    pub timestamp: i64,
}

/// Emitted for every JoinRequest status change after submission.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct JoinRequestStatusEvent {
    pub join_request_id: Uuid,
    pub offer_id: Uuid,
    pub requester_id: String,
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
    pub seats_available: Option<u32>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct EventCancelledEvent {
    pub event_id: Uuid,
    pub cancelled_offers: usize,
    pub cancelled_requests: usize,
    pub timestamp: i64,
}

/// Everything the core records about what happened. Delivery (push, SMS) is someone else's job.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OfferPublished(OfferPublishedEvent),
    OfferWithdrawn(OfferWithdrawnEvent),
    JoinRequestSubmitted(JoinRequestSubmittedEvent),
    JoinRequestStatusChanged(JoinRequestStatusEvent),
    EventCancelled(EventCancelledEvent),
}

impl DomainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::OfferPublished(_) => "offer_published",
            DomainEvent::OfferWithdrawn(_) => "offer_withdrawn",
            DomainEvent::JoinRequestSubmitted(_) => "join_request_submitted",
            DomainEvent::JoinRequestStatusChanged(_) => "join_request_status_changed",
            DomainEvent::EventCancelled(_) => "event_cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged() {
        let event = DomainEvent::OfferPublished(OfferPublishedEvent {
            offer_id: Uuid::nil(),
            event_id: Uuid::nil(),
            total_seats: 3,
            timestamp: 0,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "offer_published");
        assert_eq!(json["total_seats"], 3);
        assert_eq!(event.kind(), "offer_published");
    }
}

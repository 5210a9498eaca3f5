pub mod events;
pub mod geo;
pub mod identity;
pub mod models;
pub mod repository;
pub mod routing;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not enough seats: requested {requested}, available {available}")]
    CapacityExceeded { requested: u32, available: u32 },
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("External lookup failed: {0}")]
    ExternalLookupFailed(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("A join request from {requester} is already open on offer {offer_id}")]
    DuplicateJoinRequest { offer_id: uuid::Uuid, requester: String },
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Only collaborator lookups are worth retrying. Everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ExternalLookupFailed(_))
    }

    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("{} {}", kind, id))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

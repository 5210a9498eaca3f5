pub mod event;
pub mod join_request;
pub mod listing;
pub mod offer;
pub mod payment;
pub mod request;

pub use event::{Event, EventStatus};
pub use join_request::{JoinRequest, JoinStatus, PickupProjection};
pub use listing::{ContactCard, ContactVisibility, Gender, LegKind, Preference, TripType};
pub use offer::{Offer, OfferStatus, OfferView, RouteLeg};
pub use payment::{PaymentMethod, PaymentMode, PaymentPolicy};
pub use request::{RequestStatus, RideRequest};

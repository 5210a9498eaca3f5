pub mod board;
pub mod cascade;
pub mod drafts;
pub mod event_store;
pub mod offer_store;
pub mod request_store;
pub mod rules;
pub mod storage;

#[cfg(test)]
mod testing;

pub use board::{Listing, RideBoard};
pub use drafts::{
    EventDraft, EventPatch, LegDraft, ListingBase, ListingDraft, OfferDraft, OfferPatch, RequestDraft,
    RequestPatch,
};
pub use event_store::{EventCancellation, EventStore};
pub use offer_store::{OfferRemoval, OfferStore};
pub use request_store::RequestStore;
pub use storage::Storage;

pub mod engine;
pub mod submission;

pub use engine::JoinRequestEngine;
pub use submission::{JoinSubmission, PassengerCountPatch};

pub mod inventory;
pub mod pricing;
pub mod projection;

pub use inventory::{InMemorySeatLedger, SeatLedger, SeatSnapshot};
pub use pricing::{PriceCapCalculator, PricingConfig};
pub use projection::PickupProjector;

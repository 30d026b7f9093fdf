//! Shared types for the order lifecycle system.

pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::OrderId;

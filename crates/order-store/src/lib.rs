//! Persistence seam for orders.
//!
//! Stores keep the full [`Order`](domain::Order) shape, history included,
//! keyed by id and versioned by history length so that a late write of an
//! older snapshot never overwrites a newer one.

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use file::FileOrderStore;
pub use memory::InMemoryOrderStore;
pub use store::{OrderStore, Version};

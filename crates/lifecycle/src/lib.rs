//! Order lifecycle coordination.
//!
//! [`OrderLifecycle`] owns the live order collection. Transitions on one
//! order are serialized; transitions on different orders never contend, and
//! reads (including [`OrderStatistics`]) never wait on an order's lock.

pub mod coordinator;
pub mod error;
pub mod statistics;

pub use coordinator::OrderLifecycle;
pub use error::{LifecycleError, Result};
pub use statistics::OrderStatistics;

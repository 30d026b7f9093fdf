//! Coordinator error types.

use common::OrderId;
use domain::{ConfigurationError, HistoryError, OrderState, ValidationError};
use order_store::StoreError;
use thiserror::Error;

/// Errors returned by [`OrderLifecycle`](crate::OrderLifecycle) operations.
///
/// Every failing operation leaves the order collection untouched.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed input.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested edge is not legal from the order's current state.
    #[error("Invalid transition for order {order_id}: cannot move from {current} to {attempted}")]
    InvalidTransition {
        order_id: OrderId,
        current: OrderState,
        attempted: OrderState,
    },

    /// The SLA policy or lifecycle configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The backing store failed while restoring.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A stored order breaks the history invariants.
    #[error("Corrupt order {order_id}: {source}")]
    CorruptOrder {
        order_id: OrderId,
        #[source]
        source: HistoryError,
    },

    /// Two stored documents carry the same order id.
    #[error("Order {0} is stored more than once")]
    DuplicateOrder(OrderId),
}

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

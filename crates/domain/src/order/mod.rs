//! Order aggregate and related types.

mod aggregate;
mod commands;
mod state;
mod transition;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CreateOrder, TransitionOrder};
pub use state::{OrderState, UnknownState};
pub use transition::{Metadata, SYSTEM_AGENT, TransitionRecord};
pub use value_objects::{Money, OrderItem, Priority, Sku};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed input to an order operation. Nothing is mutated when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Customer email is required.
    #[error("Customer email is required")]
    CustomerEmailRequired,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// A line item has a blank SKU.
    #[error("Item at line {line} has an empty SKU")]
    EmptySku { line: usize },

    /// Invalid quantity.
    #[error("Invalid quantity for {sku}: {quantity} (must be greater than 0)")]
    InvalidQuantity { sku: String, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for {sku}: {price_cents} cents (must not be negative)")]
    NegativePrice { sku: String, price_cents: i64 },

    /// A line total or the order total does not fit in the money range.
    #[error("Amount overflows at item {sku}")]
    AmountOverflow { sku: String },

    /// Priority has no SLA entry.
    #[error("Priority {priority} has no SLA policy entry")]
    UnresolvablePriority { priority: Priority },

    /// A transition must name the agent that caused it.
    #[error("Transition agent is required")]
    AgentRequired,
}

/// An attempted edge is not allowed from the order's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot move from {current} to {attempted}")]
pub struct TransitionError {
    pub current: OrderState,
    pub attempted: OrderState,
}

/// A stored order whose history breaks the entity invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// History must start with the seed record.
    #[error("History is empty or does not start with the creation record")]
    MissingSeed,

    /// The seed record is stamped with the creation time.
    #[error("Creation record at {seeded} does not match created_at {created_at}")]
    SeedTimestampMismatch {
        created_at: DateTime<Utc>,
        seeded: DateTime<Utc>,
    },

    /// Timestamps must strictly increase.
    #[error("History entry {index} is not later than its predecessor")]
    NonMonotonicTimestamp { index: usize },

    /// Each record must start where the previous one ended.
    #[error("History entry {index} starts from {from}, expected {expected}")]
    BrokenChain {
        index: usize,
        from: OrderState,
        expected: OrderState,
    },

    /// Each edge must be legal in the lifecycle graph.
    #[error("History entry {index} records an illegal edge {from} -> {to}")]
    IllegalEdge {
        index: usize,
        from: OrderState,
        to: OrderState,
    },

    /// Current state must match the last record.
    #[error("Current state {state} does not match last history entry {last}")]
    StateMismatch { state: OrderState, last: OrderState },

    /// Total must equal the sum of line totals.
    #[error("Total {total} does not match the sum of line totals {expected}")]
    TotalMismatch { total: Money, expected: Money },
}

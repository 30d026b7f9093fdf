//! Domain layer for the order lifecycle system.
//!
//! This crate provides:
//! - The [`Order`] aggregate with its line items and append-only history
//! - The [`LifecycleGraph`] deciding which state changes are legal
//! - The [`SlaPolicy`] mapping priority to allowed processing time

pub mod lifecycle;
pub mod order;
pub mod sla;

pub use lifecycle::LifecycleGraph;
pub use order::{
    CreateOrder, HistoryError, Metadata, Money, Order, OrderItem, OrderState, Priority,
    SYSTEM_AGENT, Sku, TransitionError, TransitionOrder, TransitionRecord, UnknownState,
    ValidationError,
};
pub use sla::{ConfigurationError, MAX_SLA_HOURS, SlaPolicy};

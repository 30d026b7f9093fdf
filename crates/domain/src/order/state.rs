//! Order lifecycle states.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// The working chain:
/// ```text
/// Created ─► Confirmed ─► Planned ─► InProduction ─► Produced ─► Packed
///    ─► Shipped ─► Delivered ─► Invoiced ─► Closed
/// ```
///
/// `OnHold` and `Cancelled` only participate in the extended graph
/// (see [`LifecycleGraph`](crate::LifecycleGraph)).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Order has been received.
    #[default]
    Created,

    /// Sales has confirmed the order with the customer.
    Confirmed,

    /// Production planning has scheduled the work.
    Planned,

    /// Manufacturing is under way.
    InProduction,

    /// Manufacturing finished and quality has signed off.
    Produced,

    /// Goods are packed for shipment.
    Packed,

    /// Logistics has handed the goods to a carrier.
    Shipped,

    /// Customer has received the goods.
    Delivered,

    /// Finance has issued the invoice.
    Invoiced,

    /// Payment received, order closed (terminal state).
    Closed,

    /// Work is paused; resumes to the state it was held from.
    OnHold,

    /// Order was abandoned (terminal state).
    Cancelled,
}

impl OrderState {
    /// The working chain in lifecycle order.
    pub const CHAIN: [OrderState; 10] = [
        OrderState::Created,
        OrderState::Confirmed,
        OrderState::Planned,
        OrderState::InProduction,
        OrderState::Produced,
        OrderState::Packed,
        OrderState::Shipped,
        OrderState::Delivered,
        OrderState::Invoiced,
        OrderState::Closed,
    ];

    /// Every state, chain first.
    pub const ALL: [OrderState; 12] = [
        OrderState::Created,
        OrderState::Confirmed,
        OrderState::Planned,
        OrderState::InProduction,
        OrderState::Produced,
        OrderState::Packed,
        OrderState::Shipped,
        OrderState::Delivered,
        OrderState::Invoiced,
        OrderState::Closed,
        OrderState::OnHold,
        OrderState::Cancelled,
    ];

    /// Returns the next state along the working chain.
    ///
    /// `None` for `Closed` and for states outside the chain.
    pub fn successor(&self) -> Option<OrderState> {
        match self {
            OrderState::Created => Some(OrderState::Confirmed),
            OrderState::Confirmed => Some(OrderState::Planned),
            OrderState::Planned => Some(OrderState::InProduction),
            OrderState::InProduction => Some(OrderState::Produced),
            OrderState::Produced => Some(OrderState::Packed),
            OrderState::Packed => Some(OrderState::Shipped),
            OrderState::Shipped => Some(OrderState::Delivered),
            OrderState::Delivered => Some(OrderState::Invoiced),
            OrderState::Invoiced => Some(OrderState::Closed),
            OrderState::Closed | OrderState::OnHold | OrderState::Cancelled => None,
        }
    }

    /// Returns true if this state lies on the working chain.
    pub fn is_on_chain(&self) -> bool {
        !matches!(self, OrderState::OnHold | OrderState::Cancelled)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Closed | OrderState::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::Confirmed => "CONFIRMED",
            OrderState::Planned => "PLANNED",
            OrderState::InProduction => "IN_PRODUCTION",
            OrderState::Produced => "PRODUCED",
            OrderState::Packed => "PACKED",
            OrderState::Shipped => "SHIPPED",
            OrderState::Delivered => "DELIVERED",
            OrderState::Invoiced => "INVOICED",
            OrderState::Closed => "CLOSED",
            OrderState::OnHold => "ON_HOLD",
            OrderState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order state: {0}")]
pub struct UnknownState(pub String);

impl std::str::FromStr for OrderState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

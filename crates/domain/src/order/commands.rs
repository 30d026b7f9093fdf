//! Order commands.

use common::OrderId;

use super::{Metadata, Money, OrderItem, OrderState, Priority, ValidationError};

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// Email of the originating customer.
    pub customer_email: String,

    /// Display name of the originating customer.
    pub customer_name: String,

    /// Line items, in the order they were submitted.
    pub items: Vec<OrderItem>,

    /// Priority level; 1 is the most urgent.
    pub priority: Priority,

    /// Provenance (source system, originating message id, annotations).
    pub metadata: Metadata,
}

impl CreateOrder {
    /// Creates a new CreateOrder command with empty metadata.
    pub fn new(
        customer_email: impl Into<String>,
        customer_name: impl Into<String>,
        items: Vec<OrderItem>,
        priority: Priority,
    ) -> Self {
        Self {
            customer_email: customer_email.into(),
            customer_name: customer_name.into(),
            items,
            priority,
            metadata: Metadata::new(),
        }
    }

    /// Attaches provenance metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks the input shape: customer present, items non-empty, each item
    /// with a SKU, a positive quantity and a non-negative price, and every
    /// line total as well as their sum representable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_email.trim().is_empty() {
            return Err(ValidationError::CustomerEmailRequired);
        }

        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let mut total = Money::zero();
        for (line, item) in self.items.iter().enumerate() {
            if item.sku().is_blank() {
                return Err(ValidationError::EmptySku { line });
            }

            if item.quantity() == 0 {
                return Err(ValidationError::InvalidQuantity {
                    sku: item.sku().to_string(),
                    quantity: item.quantity(),
                });
            }

            if item.unit_price().is_negative() {
                return Err(ValidationError::NegativePrice {
                    sku: item.sku().to_string(),
                    price_cents: item.unit_price().cents(),
                });
            }

            total = item
                .unit_price()
                .checked_multiply(item.quantity())
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| ValidationError::AmountOverflow {
                    sku: item.sku().to_string(),
                })?;
        }

        Ok(())
    }
}

/// Command to move an order to a new lifecycle state.
#[derive(Debug, Clone)]
pub struct TransitionOrder {
    /// The order to transition.
    pub order_id: OrderId,

    /// The requested state.
    pub target_state: OrderState,

    /// Actor causing the transition.
    pub agent: String,

    /// Free-text justification.
    pub reason: String,

    /// Transition-specific facts (tracking numbers, invoice ids, ...).
    pub metadata: Metadata,
}

impl TransitionOrder {
    /// Creates a new TransitionOrder command with empty metadata.
    pub fn new(
        order_id: OrderId,
        target_state: OrderState,
        agent: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            target_state,
            agent: agent.into(),
            reason: reason.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attaches transition metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks that the transition names its agent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.agent.trim().is_empty() {
            return Err(ValidationError::AgentRequired);
        }
        Ok(())
    }
}

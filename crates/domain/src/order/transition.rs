//! Audit records for state changes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderState;

/// Open provenance mapping attached to orders and transitions.
///
/// Opaque to the lifecycle: nothing in this crate branches on its contents.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Agent name recorded on the seed record of every order.
pub const SYSTEM_AGENT: &str = "system";

/// One entry in an order's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    from_state: OrderState,
    to_state: OrderState,
    agent: String,
    reason: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
}

impl TransitionRecord {
    /// Creates a transition record.
    pub fn new(
        from_state: OrderState,
        to_state: OrderState,
        agent: impl Into<String>,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: Metadata,
    ) -> Self {
        Self {
            from_state,
            to_state,
            agent: agent.into(),
            reason: reason.into(),
            timestamp,
            metadata,
        }
    }

    /// The synthetic record every order's history starts with.
    pub fn seed(created_at: DateTime<Utc>) -> Self {
        Self::new(
            OrderState::Created,
            OrderState::Created,
            SYSTEM_AGENT,
            "Order created",
            created_at,
            Metadata::new(),
        )
    }

    pub fn from_state(&self) -> OrderState {
        self.from_state
    }

    pub fn to_state(&self) -> OrderState {
        self.to_state
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns true for the synthetic creation record.
    pub fn is_seed(&self) -> bool {
        self.from_state == OrderState::Created
            && self.to_state == OrderState::Created
            && self.agent == SYSTEM_AGENT
    }
}

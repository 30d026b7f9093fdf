//! Order aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleGraph;
use crate::sla::SlaPolicy;

use super::{
    CreateOrder, HistoryError, Metadata, Money, OrderItem, OrderState, Priority, TransitionError,
    TransitionRecord, ValidationError,
};

/// Order aggregate root.
///
/// Everything except `state` and `history` is fixed at creation. Those two
/// only change together, through [`Order::record_transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Customer who placed the order.
    customer_email: String,
    customer_name: String,

    /// Items in submission order.
    items: Vec<OrderItem>,

    /// Sum of item line totals.
    total_amount: Money,

    priority: Priority,

    /// Resolved from the SLA policy at creation; later policy changes do not apply.
    sla_hours: u32,

    #[serde(default)]
    metadata: Metadata,

    /// Current state of the order.
    #[serde(rename = "current_state")]
    state: OrderState,

    created_at: DateTime<Utc>,

    /// Append-only audit trail, starting with the creation record.
    history: Vec<TransitionRecord>,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Returns all items in submission order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn sla_hours(&self) -> u32 {
        self.sla_hours
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the full transition history, oldest first.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Returns the most recent transition record.
    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.history.last()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Instant by which the order should have closed.
    ///
    /// A deadline past the end of the calendar clamps to its last instant,
    /// so such an order never becomes overdue.
    pub fn sla_deadline(&self) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(Duration::hours(i64::from(self.sla_hours)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True when the order is still open and more than `sla_hours` have
    /// elapsed since creation.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_terminal() && now > self.sla_deadline()
    }

    /// Timestamp of the record that closed the order.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .rev()
            .find(|record| record.to_state() == OrderState::Closed)
            .map(TransitionRecord::timestamp)
    }

    /// Time from creation to closing, if closed.
    pub fn processing_time(&self) -> Option<Duration> {
        self.closed_at().map(|closed| closed - self.created_at)
    }

    /// The state an on-hold order will resume to.
    pub fn held_from(&self) -> Option<OrderState> {
        match (self.state, self.history.last()) {
            (OrderState::OnHold, Some(record)) => Some(record.from_state()),
            _ => None,
        }
    }
}

// Command methods
impl Order {
    /// Creates a new order.
    ///
    /// Validates the command, resolves the SLA allowance for its priority,
    /// computes the total, and seeds the history with the creation record.
    pub fn create(
        id: OrderId,
        cmd: CreateOrder,
        policy: &SlaPolicy,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        cmd.validate()?;

        let sla_hours = policy
            .hours_for(cmd.priority)
            .map_err(|_| ValidationError::UnresolvablePriority {
                priority: cmd.priority,
            })?;

        let total_amount = cmd.items.iter().map(OrderItem::line_total).sum();

        Ok(Self {
            id,
            customer_email: cmd.customer_email,
            customer_name: cmd.customer_name,
            items: cmd.items,
            total_amount,
            priority: cmd.priority,
            sla_hours,
            metadata: cmd.metadata,
            state: OrderState::Created,
            created_at,
            history: vec![TransitionRecord::seed(created_at)],
        })
    }

    /// Gives a not-yet-registered order a different id.
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    /// Moves the order to `target` and appends the audit record.
    ///
    /// The record's timestamp is `now`, pushed forward to one microsecond
    /// after the previous record when the clock has not advanced past it.
    /// On error the order is unchanged.
    pub fn record_transition(
        &mut self,
        graph: LifecycleGraph,
        target: OrderState,
        agent: impl Into<String>,
        reason: impl Into<String>,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<&TransitionRecord, TransitionError> {
        graph.check(self, target)?;

        let timestamp = match self.history.last() {
            Some(last) if now <= last.timestamp() => last.timestamp() + Duration::microseconds(1),
            _ => now,
        };

        self.history.push(TransitionRecord::new(
            self.state, target, agent, reason, timestamp, metadata,
        ));
        self.state = target;

        Ok(&self.history[self.history.len() - 1])
    }

    /// Checks a reconstructed order against the entity invariants.
    pub fn verify(&self, graph: LifecycleGraph) -> Result<(), HistoryError> {
        let first = self.history.first().ok_or(HistoryError::MissingSeed)?;
        if !first.is_seed() {
            return Err(HistoryError::MissingSeed);
        }
        if first.timestamp() != self.created_at {
            return Err(HistoryError::SeedTimestampMismatch {
                created_at: self.created_at,
                seeded: first.timestamp(),
            });
        }

        for (index, pair) in self.history.windows(2).enumerate() {
            let (prev, record) = (&pair[0], &pair[1]);
            let index = index + 1;

            if record.timestamp() <= prev.timestamp() {
                return Err(HistoryError::NonMonotonicTimestamp { index });
            }

            if record.from_state() != prev.to_state() {
                return Err(HistoryError::BrokenChain {
                    index,
                    from: record.from_state(),
                    expected: prev.to_state(),
                });
            }

            let resumes_correctly = record.from_state() != OrderState::OnHold
                || record.to_state() == OrderState::Cancelled
                || record.to_state() == prev.from_state();
            if !graph.is_legal(record.from_state(), record.to_state()) || !resumes_correctly {
                return Err(HistoryError::IllegalEdge {
                    index,
                    from: record.from_state(),
                    to: record.to_state(),
                });
            }
        }

        let last = self.history[self.history.len() - 1].to_state();
        if self.state != last {
            return Err(HistoryError::StateMismatch {
                state: self.state,
                last,
            });
        }

        let expected: Money = self.items.iter().map(OrderItem::line_total).sum();
        if self.total_amount != expected {
            return Err(HistoryError::TotalMismatch {
                total: self.total_amount,
                expected,
            });
        }

        Ok(())
    }
}

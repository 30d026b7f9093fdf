//! Dashboard aggregates over the order collection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domain::{LifecycleGraph, Money, Order, OrderState, Priority};
use serde::{Deserialize, Serialize};

/// Point-in-time summary of all orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatistics {
    /// Instant the overdue check was evaluated at.
    pub as_of: DateTime<Utc>,

    pub total_orders: usize,

    /// Count per state. Every state of the active graph is present.
    pub by_state: BTreeMap<OrderState, usize>,

    /// Count per priority, for priorities with at least one order.
    pub by_priority: BTreeMap<Priority, usize>,

    /// Open orders past their SLA deadline.
    pub overdue_count: usize,

    /// Sum of order totals, cancelled orders excluded.
    pub total_value: Money,

    /// Mean creation-to-close time of closed orders, in hours. 0.0 when none
    /// have closed.
    pub avg_processing_time_hours: f64,
}

impl OrderStatistics {
    /// Statistics over no orders.
    pub fn empty(graph: LifecycleGraph, as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            total_orders: 0,
            by_state: graph.states().iter().map(|&state| (state, 0)).collect(),
            by_priority: BTreeMap::new(),
            overdue_count: 0,
            total_value: Money::zero(),
            avg_processing_time_hours: 0.0,
        }
    }

    /// Folds `orders` into statistics, judging overdue against `now`.
    pub fn collect<'a>(
        graph: LifecycleGraph,
        orders: impl IntoIterator<Item = &'a Order>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self::empty(graph, now);
        let mut closed = 0u32;
        let mut processing_hours = 0.0;

        for order in orders {
            stats.total_orders += 1;
            *stats.by_state.entry(order.state()).or_default() += 1;
            *stats.by_priority.entry(order.priority()).or_default() += 1;

            if order.is_overdue(now) {
                stats.overdue_count += 1;
            }

            if order.state() != OrderState::Cancelled {
                stats.total_value += order.total_amount();
            }

            if let Some(elapsed) = order.processing_time() {
                closed += 1;
                processing_hours += elapsed.num_milliseconds() as f64 / 3_600_000.0;
            }
        }

        if closed > 0 {
            stats.avg_processing_time_hours = processing_hours / f64::from(closed);
        }

        stats
    }

    /// Number of orders currently in `state`.
    pub fn count_in(&self, state: OrderState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }
}

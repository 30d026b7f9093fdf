//! The order lifecycle coordinator.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use common::{Clock, OrderId, SystemClock};
use domain::{CreateOrder, LifecycleGraph, Order, OrderState, SlaPolicy, TransitionOrder};
use order_store::{OrderStore, StoreError};
use tokio::sync::{Mutex, RwLock};

use crate::error::{LifecycleError, Result};
use crate::statistics::OrderStatistics;

/// One live order.
///
/// `gate` serializes writers. `current` holds the last committed snapshot and
/// is swapped in whole, so readers see state and history change together
/// without taking `gate`.
struct OrderSlot {
    gate: Mutex<()>,
    current: ArcSwap<Order>,
}

impl OrderSlot {
    fn new(order: Order) -> Self {
        Self {
            gate: Mutex::new(()),
            current: ArcSwap::from_pointee(order),
        }
    }

    fn snapshot(&self) -> Arc<Order> {
        self.current.load_full()
    }
}

/// Creates, transitions and reports on orders.
///
/// The SLA policy, lifecycle graph and clock are fixed at construction.
/// The registry lock is only held to look up or insert a slot; each order is
/// then locked on its own, and never across I/O.
pub struct OrderLifecycle {
    policy: SlaPolicy,
    graph: LifecycleGraph,
    clock: Arc<dyn Clock>,
    orders: RwLock<HashMap<OrderId, Arc<OrderSlot>>>,
    store: Option<Arc<dyn OrderStore>>,
}

impl OrderLifecycle {
    /// Creates an empty coordinator with no backing store.
    pub fn new(policy: SlaPolicy, graph: LifecycleGraph, clock: impl Clock + 'static) -> Self {
        Self {
            policy,
            graph,
            clock: Arc::new(clock),
            orders: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Writes every committed order through to `store`.
    pub fn with_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Rebuilds a coordinator from everything in `store`.
    ///
    /// Each order's history is checked against `graph` first; one corrupt
    /// or duplicated order fails the whole restore.
    #[tracing::instrument(skip_all, fields(graph = %graph))]
    pub async fn restore(
        policy: SlaPolicy,
        graph: LifecycleGraph,
        clock: impl Clock + 'static,
        store: Arc<dyn OrderStore>,
    ) -> Result<Self> {
        let stored = store.load_all().await?;

        let mut orders = HashMap::with_capacity(stored.len());
        for order in stored {
            let order_id = order.id();
            order
                .verify(graph)
                .map_err(|source| LifecycleError::CorruptOrder { order_id, source })?;
            match orders.entry(order_id) {
                Entry::Occupied(_) => return Err(LifecycleError::DuplicateOrder(order_id)),
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(OrderSlot::new(order)));
                }
            }
        }

        tracing::info!(count = orders.len(), "restored orders from store");

        Ok(Self {
            policy,
            graph,
            clock: Arc::new(clock),
            orders: RwLock::new(orders),
            store: Some(store),
        })
    }

    pub fn policy(&self) -> &SlaPolicy {
        &self.policy
    }

    pub fn graph(&self) -> LifecycleGraph {
        self.graph
    }

    /// Current time on the coordinator's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a new order in the CREATED state.
    ///
    /// Nothing is inserted unless the whole command validates.
    #[tracing::instrument(
        skip(self, cmd),
        fields(customer = %cmd.customer_email, priority = %cmd.priority)
    )]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        let created_at = self.clock.now();

        let mut order =
            Order::create(OrderId::new(), cmd, &self.policy, created_at).inspect_err(|e| {
                tracing::warn!(error = %e, "order creation rejected");
            })?;

        {
            let mut orders = self.orders.write().await;
            while orders.contains_key(&order.id()) {
                order = order.with_id(OrderId::new());
            }
            orders.insert(order.id(), Arc::new(OrderSlot::new(order.clone())));
        }

        metrics::counter!("lifecycle_orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            total = %order.total_amount(),
            sla_hours = order.sla_hours(),
            "order created"
        );

        self.persist(&order).await;
        Ok(order)
    }

    /// Moves an order to `cmd.target_state` and returns the committed snapshot.
    ///
    /// Attempts on the same order run one at a time; each is checked against
    /// the state the previous one left behind. A rejected attempt leaves the
    /// order unchanged.
    #[tracing::instrument(
        skip(self, cmd),
        fields(order_id = %cmd.order_id, target = %cmd.target_state, agent = %cmd.agent)
    )]
    pub async fn transition_order(&self, cmd: TransitionOrder) -> Result<Order> {
        cmd.validate()?;

        let TransitionOrder {
            order_id,
            target_state,
            agent,
            reason,
            metadata,
        } = cmd;

        let slot = self.slot(order_id).await?;

        let committed = {
            let _gate = slot.gate.lock().await;

            let mut next = Order::clone(&slot.snapshot());
            let now = self.clock.now();
            if let Err(e) =
                next.record_transition(self.graph, target_state, agent, reason, metadata, now)
            {
                metrics::counter!("lifecycle_transitions_rejected_total").increment(1);
                tracing::warn!(current = %e.current, "transition rejected");
                return Err(LifecycleError::InvalidTransition {
                    order_id,
                    current: e.current,
                    attempted: e.attempted,
                });
            }

            let committed = Arc::new(next);
            slot.current.store(Arc::clone(&committed));
            committed
        };

        metrics::counter!("lifecycle_transitions_total", "to_state" => target_state.as_str())
            .increment(1);
        tracing::info!(history_len = committed.history().len(), "order transitioned");

        self.persist(&committed).await;
        Ok(Order::clone(&committed))
    }

    /// Returns a snapshot of one order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let slot = self.slot(order_id).await?;
        Ok(Order::clone(&slot.snapshot()))
    }

    /// Returns every order, oldest first.
    pub async fn list_orders(&self) -> Vec<Order> {
        self.collect_orders(|_| true).await
    }

    /// Returns orders currently in `state`, oldest first.
    pub async fn orders_in_state(&self, state: OrderState) -> Vec<Order> {
        self.collect_orders(|order| order.state() == state).await
    }

    /// Returns open orders past their SLA deadline, oldest first.
    pub async fn overdue_orders(&self) -> Vec<Order> {
        let now = self.clock.now();
        self.collect_orders(|order| order.is_overdue(now)).await
    }

    /// Summarizes the collection as of now.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_statistics(&self) -> OrderStatistics {
        let snapshots = self.snapshots().await;
        let now = self.clock.now();
        OrderStatistics::collect(self.graph, snapshots.iter().map(Arc::as_ref), now)
    }

    /// Number of orders held.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    async fn slot(&self, order_id: OrderId) -> Result<Arc<OrderSlot>> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(LifecycleError::OrderNotFound(order_id))
    }

    /// Committed snapshots of every order. Takes no order locks.
    async fn snapshots(&self) -> Vec<Arc<Order>> {
        let orders = self.orders.read().await;
        orders.values().map(|slot| slot.snapshot()).collect()
    }

    async fn collect_orders(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut matching: Vec<Order> = self
            .snapshots()
            .await
            .iter()
            .filter(|order| keep(order))
            .map(|order| Order::clone(order))
            .collect();
        matching.sort_by_key(|order| (order.created_at(), order.id()));
        matching
    }

    /// Best-effort write-through. The in-memory commit stands either way.
    async fn persist(&self, order: &Order) {
        let Some(store) = &self.store else {
            return;
        };

        match store.save(order).await {
            Ok(version) => {
                tracing::debug!(order_id = %order.id(), %version, "order persisted");
            }
            Err(StoreError::StaleVersion { stored, attempted, .. }) => {
                tracing::debug!(
                    order_id = %order.id(),
                    %stored,
                    %attempted,
                    "newer snapshot already persisted"
                );
            }
            Err(e) => {
                metrics::counter!("lifecycle_persist_failures_total").increment(1);
                tracing::warn!(order_id = %order.id(), error = %e, "failed to persist order");
            }
        }
    }
}

impl Default for OrderLifecycle {
    fn default() -> Self {
        Self::new(SlaPolicy::standard(), LifecycleGraph::default(), SystemClock)
    }
}

impl std::fmt::Debug for OrderLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLifecycle")
            .field("policy", &self.policy)
            .field("graph", &self.graph)
            .field("clock", &self.clock)
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

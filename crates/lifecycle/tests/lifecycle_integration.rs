//! Integration tests for the order lifecycle coordinator.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{ManualClock, OrderId};
use domain::{
    CreateOrder, LifecycleGraph, MAX_SLA_HOURS, Money, Order, OrderItem, OrderState, Priority,
    SlaPolicy, TransitionOrder,
};
use futures_util::future::join_all;
use lifecycle::{LifecycleError, OrderLifecycle};
use order_store::{FileOrderStore, InMemoryOrderStore, OrderStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

struct TestHarness {
    lifecycle: Arc<OrderLifecycle>,
    clock: ManualClock,
}

impl TestHarness {
    fn new(graph: LifecycleGraph) -> Self {
        Self::with_policy(SlaPolicy::standard(), graph)
    }

    fn with_policy(policy: SlaPolicy, graph: LifecycleGraph) -> Self {
        let clock = ManualClock::new(start());
        let lifecycle = Arc::new(OrderLifecycle::new(policy, graph, clock.clone()));
        Self { lifecycle, clock }
    }

    async fn create(&self, priority: u8) -> Order {
        self.lifecycle
            .create_order(CreateOrder::new(
                "plant@example.com",
                "Plant Ops",
                vec![OrderItem::new("SKU-1", "Bracket", 3, Money::from_cents(1999))],
                Priority::new(priority),
            ))
            .await
            .unwrap()
    }

    async fn transition(
        &self,
        order_id: OrderId,
        target: OrderState,
    ) -> Result<Order, LifecycleError> {
        self.lifecycle
            .transition_order(TransitionOrder::new(order_id, target, "operator", "test step"))
            .await
    }
}

#[tokio::test]
async fn full_lifecycle_end_to_end() {
    let harness = TestHarness::new(LifecycleGraph::Strict);

    let order = harness
        .lifecycle
        .create_order(CreateOrder::new(
            "buyer@acme.test",
            "Acme Corp",
            vec![
                OrderItem::new("WIDGET-S", "Small widget", 1000, Money::from_cents(350)),
                OrderItem::new("WIDGET-L", "Large widget", 500, Money::from_cents(800)),
            ],
            Priority::new(1),
        ))
        .await
        .unwrap();

    assert_eq!(order.total_amount(), Money::from_dollars(7500));
    assert_eq!(order.sla_hours(), 24);

    for target in &OrderState::CHAIN[1..] {
        harness.clock.advance(Duration::minutes(30));
        let moved = harness.transition(order.id(), *target).await.unwrap();
        assert_eq!(moved.state(), *target);
    }

    let closed = harness.lifecycle.get_order(order.id()).await.unwrap();
    assert_eq!(closed.state(), OrderState::Closed);
    assert_eq!(closed.history().len(), 10);
    assert!(closed.verify(LifecycleGraph::Strict).is_ok());

    let stats = harness.lifecycle.get_order_statistics().await;
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.count_in(OrderState::Closed), 1);
    assert_eq!(stats.total_value, Money::from_cents(750_000));
    assert!((stats.avg_processing_time_hours - 4.5).abs() < 1e-9);
}

#[tokio::test]
async fn every_non_successor_is_rejected_without_side_effects() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let order = harness.create(2).await;

    for expected in &OrderState::CHAIN[1..] {
        let before = harness.lifecycle.get_order(order.id()).await.unwrap();

        for target in OrderState::ALL {
            if target == *expected {
                continue;
            }
            let result = harness.transition(order.id(), target).await;
            assert!(
                matches!(result, Err(LifecycleError::InvalidTransition { .. })),
                "{} -> {target} should be rejected",
                before.state()
            );
        }

        assert_eq!(harness.lifecycle.get_order(order.id()).await.unwrap(), before);
        harness.transition(order.id(), *expected).await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_same_transition_has_exactly_one_winner() {
    const ATTEMPTS: usize = 32;

    let harness = TestHarness::new(LifecycleGraph::Strict);
    let order = harness.create(1).await;

    for (step, target) in OrderState::CHAIN[1..].iter().enumerate() {
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                let lifecycle = Arc::clone(&harness.lifecycle);
                let target = *target;
                let order_id = order.id();
                tokio::spawn(async move {
                    lifecycle
                        .transition_order(TransitionOrder::new(order_id, target, "worker", "race"))
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for result in join_all(handles).await {
            match result.unwrap() {
                Ok(_) => wins += 1,
                Err(LifecycleError::InvalidTransition { current, .. }) => {
                    assert_eq!(current, *target);
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1, "step {target}");

        let current = harness.lifecycle.get_order(order.id()).await.unwrap();
        assert_eq!(current.history().len(), step + 2);
    }

    let closed = harness.lifecycle.get_order(order.id()).await.unwrap();
    assert!(closed.verify(LifecycleGraph::Strict).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_orders_progress_independently() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let mut ids = Vec::new();
    for _ in 0..16 {
        ids.push(harness.create(3).await.id());
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&order_id| {
            let lifecycle = Arc::clone(&harness.lifecycle);
            tokio::spawn(async move {
                for target in &OrderState::CHAIN[1..] {
                    lifecycle
                        .transition_order(TransitionOrder::new(order_id, *target, "line", "run"))
                        .await?;
                }
                Ok::<_, LifecycleError>(())
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let stats = harness.lifecycle.get_order_statistics().await;
    assert_eq!(stats.count_in(OrderState::Closed), 16);
    assert_eq!(stats.overdue_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn statistics_read_while_transitions_run() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let order_id = harness.create(1).await.id();

    let writer = {
        let lifecycle = Arc::clone(&harness.lifecycle);
        tokio::spawn(async move {
            for target in &OrderState::CHAIN[1..] {
                lifecycle
                    .transition_order(TransitionOrder::new(order_id, *target, "w", ""))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..50 {
        let stats = harness.lifecycle.get_order_statistics().await;
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.by_state.values().sum::<usize>(), 1);

        let snapshot = harness.lifecycle.get_order(order_id).await.unwrap();
        assert_eq!(snapshot.last_transition().unwrap().to_state(), snapshot.state());
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
}

#[tokio::test]
async fn randomized_attempts_preserve_history_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let harness = TestHarness::new(LifecycleGraph::Strict);

    let mut orders = Vec::new();
    for priority in [1, 2, 3, 1, 2] {
        orders.push(harness.create(priority).await.id());
    }
    let mut successes = vec![0usize; orders.len()];

    for _ in 0..2_000 {
        let index = rng.gen_range(0..orders.len());
        let order_id = orders[index];
        let target = OrderState::CHAIN[rng.gen_range(0..OrderState::CHAIN.len())];

        // Sometimes stall or rewind the clock to exercise timestamp ordering.
        match rng.gen_range(0..4) {
            0 => {}
            1 => harness.clock.advance(-Duration::seconds(rng.gen_range(1..60))),
            _ => harness.clock.advance(Duration::seconds(rng.gen_range(1..600))),
        }

        let before = harness.lifecycle.get_order(order_id).await.unwrap();
        let result = harness.transition(order_id, target).await;

        if before.state().successor() == Some(target) {
            assert!(result.is_ok());
            successes[index] += 1;
        } else {
            assert!(matches!(result, Err(LifecycleError::InvalidTransition { .. })));
        }

        let after = harness.lifecycle.get_order(order_id).await.unwrap();
        assert!(after.verify(LifecycleGraph::Strict).is_ok());
        assert_eq!(after.history().len(), 1 + successes[index]);
    }
}

#[tokio::test]
async fn overdue_until_closed() {
    let policy = SlaPolicy::from_pairs([(1, 2)]).unwrap();
    let harness = TestHarness::with_policy(policy, LifecycleGraph::Strict);
    let order = harness.create(1).await;
    assert_eq!(order.sla_hours(), 2);

    harness.clock.advance(Duration::hours(2));
    assert_eq!(harness.lifecycle.get_order_statistics().await.overdue_count, 0);

    harness.clock.advance(Duration::hours(1));
    let stats = harness.lifecycle.get_order_statistics().await;
    assert_eq!(stats.overdue_count, 1);
    let overdue = harness.lifecycle.overdue_orders().await;
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id(), order.id());

    for target in &OrderState::CHAIN[1..] {
        harness.transition(order.id(), *target).await.unwrap();
    }

    harness.clock.advance(Duration::days(365));
    assert_eq!(harness.lifecycle.get_order_statistics().await.overdue_count, 0);
    assert!(harness.lifecycle.overdue_orders().await.is_empty());
}

#[tokio::test]
async fn longest_allowed_sla_keeps_statistics_readable() {
    let policy = SlaPolicy::from_pairs([(1, MAX_SLA_HOURS)]).unwrap();
    let harness = TestHarness::with_policy(policy, LifecycleGraph::Strict);
    harness.create(1).await;

    harness.clock.advance(Duration::days(365 * 50));
    let stats = harness.lifecycle.get_order_statistics().await;
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.overdue_count, 0);
    assert!(harness.lifecycle.overdue_orders().await.is_empty());
}

#[tokio::test]
async fn list_and_filter_by_state() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let first = harness.create(1).await;
    harness.clock.advance(Duration::seconds(1));
    let second = harness.create(2).await;
    harness.transition(second.id(), OrderState::Confirmed).await.unwrap();

    let all = harness.lifecycle.list_orders().await;
    assert_eq!(
        all.iter().map(Order::id).collect::<Vec<_>>(),
        vec![first.id(), second.id()]
    );

    let created = harness.lifecycle.orders_in_state(OrderState::Created).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id(), first.id());
    assert!(harness.lifecycle.orders_in_state(OrderState::Closed).await.is_empty());
}

#[tokio::test]
async fn empty_collection_statistics() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let stats = harness.lifecycle.get_order_statistics().await;

    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.overdue_count, 0);
    assert_eq!(stats.total_value, Money::zero());
    assert_eq!(stats.avg_processing_time_hours, 0.0);
    assert!(OrderState::CHAIN.iter().all(|s| stats.count_in(*s) == 0));
}

#[tokio::test]
async fn serialized_order_round_trips() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let order = harness.create(2).await;
    for target in &OrderState::CHAIN[1..] {
        harness.clock.advance(Duration::minutes(7));
        harness.transition(order.id(), *target).await.unwrap();
    }

    let closed = harness.lifecycle.get_order(order.id()).await.unwrap();
    let json = serde_json::to_string(&closed).unwrap();
    let back: Order = serde_json::from_str(&json).unwrap();

    assert_eq!(back, closed);
    assert!(back.verify(LifecycleGraph::Strict).is_ok());
}

#[tokio::test]
async fn restore_from_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn OrderStore> = Arc::new(FileOrderStore::open(dir.path()).await.unwrap());
    let clock = ManualClock::new(start());

    let order_id = {
        let lifecycle =
            OrderLifecycle::new(SlaPolicy::standard(), LifecycleGraph::Strict, clock.clone())
                .with_store(Arc::clone(&store));
        let order = lifecycle
            .create_order(CreateOrder::new(
                "buyer@example.com",
                "Buyer",
                vec![OrderItem::new("SKU-9", "Gear", 2, Money::from_cents(4200))],
                Priority::new(2),
            ))
            .await
            .unwrap();
        for target in [OrderState::Confirmed, OrderState::Planned] {
            clock.advance(Duration::minutes(1));
            lifecycle
                .transition_order(TransitionOrder::new(order.id(), target, "planner", ""))
                .await
                .unwrap();
        }
        order.id()
    };

    let restored = OrderLifecycle::restore(
        SlaPolicy::standard(),
        LifecycleGraph::Strict,
        clock.clone(),
        Arc::clone(&store),
    )
    .await
    .unwrap();

    let order = restored.get_order(order_id).await.unwrap();
    assert_eq!(order.state(), OrderState::Planned);
    assert_eq!(order.history().len(), 3);

    // The restored coordinator keeps writing through.
    restored
        .transition_order(TransitionOrder::new(order_id, OrderState::InProduction, "line", ""))
        .await
        .unwrap();
    let stored = store.load(order_id).await.unwrap().unwrap();
    assert_eq!(stored.state(), OrderState::InProduction);
}

#[tokio::test]
async fn restore_rejects_order_stored_twice() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn OrderStore> = Arc::new(FileOrderStore::open(dir.path()).await.unwrap());
    let lifecycle = OrderLifecycle::new(
        SlaPolicy::standard(),
        LifecycleGraph::Strict,
        ManualClock::new(start()),
    )
    .with_store(Arc::clone(&store));
    let order = lifecycle
        .create_order(CreateOrder::new(
            "buyer@example.com",
            "Buyer",
            vec![OrderItem::new("SKU-1", "Part", 1, Money::from_cents(100))],
            Priority::new(1),
        ))
        .await
        .unwrap();

    let original = dir.path().join(format!("{}.json", order.id()));
    std::fs::copy(&original, dir.path().join("backup-copy.json")).unwrap();

    let result = OrderLifecycle::restore(
        SlaPolicy::standard(),
        LifecycleGraph::Strict,
        ManualClock::new(start()),
        store,
    )
    .await;

    assert!(matches!(result, Err(LifecycleError::DuplicateOrder(id)) if id == order.id()));
}

#[tokio::test]
async fn restore_rejects_history_illegal_for_graph() {
    let store = Arc::new(InMemoryOrderStore::new());
    let extended = OrderLifecycle::new(
        SlaPolicy::standard(),
        LifecycleGraph::Extended,
        ManualClock::new(start()),
    )
    .with_store(store.clone());
    let order = extended
        .create_order(CreateOrder::new(
            "buyer@example.com",
            "Buyer",
            vec![OrderItem::new("SKU-1", "Part", 1, Money::from_cents(100))],
            Priority::new(1),
        ))
        .await
        .unwrap();
    extended
        .transition_order(TransitionOrder::new(order.id(), OrderState::Cancelled, "sales", ""))
        .await
        .unwrap();

    let result = OrderLifecycle::restore(
        SlaPolicy::standard(),
        LifecycleGraph::Strict,
        ManualClock::new(start()),
        store,
    )
    .await;

    assert!(matches!(result, Err(LifecycleError::CorruptOrder { .. })));
}

#[tokio::test]
async fn extended_graph_cancel_and_hold() {
    let harness = TestHarness::new(LifecycleGraph::Extended);
    let held = harness.create(1).await;
    let cancelled = harness.create(1).await;

    harness.transition(held.id(), OrderState::Confirmed).await.unwrap();
    harness.transition(held.id(), OrderState::OnHold).await.unwrap();
    assert!(matches!(
        harness.transition(held.id(), OrderState::Planned).await,
        Err(LifecycleError::InvalidTransition {
            current: OrderState::OnHold,
            attempted: OrderState::Planned,
            ..
        })
    ));
    let resumed = harness.transition(held.id(), OrderState::Confirmed).await.unwrap();
    assert_eq!(resumed.history().len(), 4);

    harness.transition(cancelled.id(), OrderState::Cancelled).await.unwrap();
    for target in OrderState::ALL {
        assert!(harness.transition(cancelled.id(), target).await.is_err());
    }

    harness.clock.advance(Duration::days(10));
    let stats = harness.lifecycle.get_order_statistics().await;
    assert_eq!(stats.by_state.len(), 12);
    assert_eq!(stats.count_in(OrderState::Cancelled), 1);
    assert_eq!(stats.count_in(OrderState::Confirmed), 1);
    assert_eq!(stats.overdue_count, 1);
    assert_eq!(stats.total_value, resumed.total_amount());
}

#[tokio::test]
async fn strict_graph_refuses_cancel_and_hold() {
    let harness = TestHarness::new(LifecycleGraph::Strict);
    let order = harness.create(1).await;

    for target in [OrderState::Cancelled, OrderState::OnHold] {
        assert!(matches!(
            harness.transition(order.id(), target).await,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }
}

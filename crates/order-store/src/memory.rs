use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderId, OrderStore, Result, StoreError, Version};

/// In-memory order store implementation for testing.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> Result<Version> {
        let attempted = Version::of(order);
        let mut orders = self.orders.write().await;

        if let Some(existing) = orders.get(&order.id()) {
            let stored = Version::of(existing);
            if stored >= attempted {
                return Err(StoreError::StaleVersion {
                    order_id: order.id(),
                    stored,
                    attempted,
                });
            }
        }

        orders.insert(order.id(), order.clone());
        Ok(attempted)
    }

    async fn load(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.created_at());
        Ok(all)
    }
}

use async_trait::async_trait;
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::{OrderId, Result};

/// Version of a stored order: the length of its history.
///
/// History is append-only, so a longer history is always the newer snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the version of an order snapshot.
    pub fn of(order: &Order) -> Self {
        Self(order.history().len() as u64)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order snapshot.
    ///
    /// Fails with `StaleVersion` if the stored snapshot's version is greater
    /// than or equal to the one being saved. Returns the saved version.
    async fn save(&self, order: &Order) -> Result<Version>;

    /// Loads one order. Returns None if it was never saved.
    async fn load(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads every stored order.
    async fn load_all(&self) -> Result<Vec<Order>>;

    /// Gets the stored version of an order.
    ///
    /// Returns None if the order doesn't exist.
    async fn version_of(&self, order_id: OrderId) -> Result<Option<Version>> {
        Ok(self.load(order_id).await?.as_ref().map(Version::of))
    }
}

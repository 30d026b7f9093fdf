//! File-backed order store: one JSON document per order.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::Order;
use tokio::fs;
use tokio::sync::Mutex;

use crate::{OrderId, OrderStore, Result, StoreError, Version};

/// Stores each order as `<dir>/<order-id>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub struct FileOrderStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileOrderStore {
    /// Opens (creating if needed) a store rooted at `base_path`.
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        tracing::debug!(path = %base_path.display(), "opened file order store");
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the directory orders are stored in.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, order_id: OrderId) -> PathBuf {
        self.base_path.join(format!("{order_id}.json"))
    }

    async fn read_order(path: &Path) -> Result<Option<Order>> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl OrderStore for FileOrderStore {
    async fn save(&self, order: &Order) -> Result<Version> {
        let attempted = Version::of(order);
        let path = self.path_for(order.id());
        let data = serde_json::to_vec_pretty(order)?;

        let _guard = self.write_lock.lock().await;

        if let Some(existing) = Self::read_order(&path).await? {
            let stored = Version::of(&existing);
            if stored >= attempted {
                return Err(StoreError::StaleVersion {
                    order_id: order.id(),
                    stored,
                    attempted,
                });
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(attempted)
    }

    async fn load(&self, order_id: OrderId) -> Result<Option<Order>> {
        Self::read_order(&self.path_for(order_id)).await
    }

    async fn load_all(&self) -> Result<Vec<Order>> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut orders = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(order) = Self::read_order(&path).await? {
                orders.push(order);
            }
        }

        orders.sort_by_key(|o| o.created_at());
        Ok(orders)
    }
}

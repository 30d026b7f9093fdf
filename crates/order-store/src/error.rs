use std::path::PathBuf;

use thiserror::Error;

use crate::{OrderId, Version};

/// Errors that can occur when interacting with an order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored snapshot is the same age or newer than the one being saved.
    #[error(
        "Stale write for order {order_id}: stored version {stored}, attempted version {attempted}"
    )]
    StaleVersion {
        order_id: OrderId,
        stored: Version,
        attempted: Version,
    },

    /// A stored document could not be read back as an order.
    #[error("Corrupt order document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A filesystem error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

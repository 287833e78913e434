//! Store error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID already exists.
    #[error("order already exists: {0}")]
    Duplicate(OrderId),

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt {column} value: {value}")]
    Decode { column: String, value: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

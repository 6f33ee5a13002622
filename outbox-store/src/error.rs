//! Error types for the task store.

use thiserror::Error;

use crate::TaskId;

/// Top-level store error type.
///
/// All store operations return this error type. A lost conditional-update
/// race is *not* an error (see
/// [`TaskStore::update_atomic`](crate::TaskStore::update_atomic)); these
/// variants cover the genuinely failed cases.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Task not found in the store.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The store itself is unreachable or rejected the operation.
    ///
    /// For the in-memory backend this only happens when fault injection or a
    /// capacity limit is in play; a relational backend would surface
    /// connection and query failures here.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}

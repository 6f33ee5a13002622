use async_trait::async_trait;

use crate::{
    query::{TaskFilter, TaskOrder},
    task::{SendTask, TaskPatch, TaskStatus},
    types::TaskId,
};

/// Trait for durable send-task storage
///
/// The queue service is the only writer; everything it does goes through
/// these operations. Backends must make [`update_atomic`] a single atomic
/// read-modify-write; that conditional update is the entire
/// concurrency-safety story for concurrent claimers, so a backend that
/// cannot honor it cannot host this queue.
///
/// [`update_atomic`]: TaskStore::update_atomic
#[async_trait]
pub trait TaskStore: Send + Sync + std::fmt::Debug {
    /// Insert a new task row
    ///
    /// # Errors
    /// If the store is unavailable or full.
    async fn insert(&self, task: SendTask) -> crate::Result<()>;

    /// Read a single task by id
    ///
    /// # Errors
    /// `StoreError::NotFound` if no such row exists.
    async fn get(&self, id: &TaskId) -> crate::Result<SendTask>;

    /// Conditionally apply `patch` if the row's status equals `expected`
    ///
    /// Returns `Ok(true)` when the patch was applied and `Ok(false)` when
    /// the status did not match; a lost claim race is a normal outcome,
    /// not an error. The comparison and the patch must happen atomically
    /// with respect to every other caller.
    ///
    /// # Errors
    /// `StoreError::NotFound` if no such row exists.
    async fn update_atomic(
        &self,
        id: &TaskId,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> crate::Result<bool>;

    /// Query tasks matching `filter`, sorted by `order`
    ///
    /// `offset` rows are skipped and at most `limit` rows returned, both
    /// applied after sorting.
    ///
    /// # Errors
    /// If the store is unavailable.
    async fn find_many(
        &self,
        filter: TaskFilter,
        order: TaskOrder,
        limit: usize,
        offset: usize,
    ) -> crate::Result<Vec<SendTask>>;

    /// Count tasks with the given status
    ///
    /// # Errors
    /// If the store is unavailable.
    async fn count(&self, status: TaskStatus) -> crate::Result<usize>;

    /// Delete a single task by id
    ///
    /// # Errors
    /// `StoreError::NotFound` if no such row exists.
    async fn delete(&self, id: &TaskId) -> crate::Result<()>;

    /// Delete every task matching `filter`, returning how many went away
    ///
    /// # Errors
    /// If the store is unavailable.
    async fn delete_many(&self, filter: TaskFilter) -> crate::Result<usize>;
}

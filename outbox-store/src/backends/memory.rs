use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    StoreError,
    query::{TaskFilter, TaskOrder},
    task::{SendTask, TaskPatch, TaskStatus},
    r#trait::TaskStore,
    types::TaskId,
};

/// In-memory task store implementation
///
/// Rows live in a `HashMap` protected by an `RwLock`. Primarily intended for
/// testing, but also usable for transient queues that may be lost on restart.
///
/// # Capacity Management
/// The store can be configured with a maximum capacity to prevent unbounded
/// memory growth. When capacity is reached, inserts fail with
/// `StoreError::Unavailable`.
///
/// # Concurrency
/// `update_atomic` takes the write lock for the whole compare-and-patch,
/// which is exactly the atomicity the claim step requires: two concurrent
/// claimers serialize on the lock and the loser sees a non-Pending status.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    pub(crate) tasks: Arc<RwLock<HashMap<TaskId, SendTask>>>,
    /// Maximum number of rows to hold (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryTaskStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store with a capacity limit
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Get the current number of rows in the store
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: SendTask) -> crate::Result<()> {
        let mut tasks = self.tasks.write()?;

        if let Some(cap) = self.capacity
            && !tasks.contains_key(&task.id)
            && tasks.len() >= cap
        {
            tracing::warn!(capacity = cap, "Memory store full, rejecting insert");
            return Err(StoreError::Unavailable(format!(
                "Memory store capacity exceeded: {}/{cap} tasks",
                tasks.len()
            )));
        }

        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> crate::Result<SendTask> {
        self.tasks
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update_atomic(
        &self,
        id: &TaskId,
        expected: TaskStatus,
        patch: TaskPatch,
    ) -> crate::Result<bool> {
        let mut tasks = self.tasks.write()?;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if task.status != expected {
            return Ok(false);
        }

        patch.apply(task);
        Ok(true)
    }

    async fn find_many(
        &self,
        filter: TaskFilter,
        order: TaskOrder,
        limit: usize,
        offset: usize,
    ) -> crate::Result<Vec<SendTask>> {
        let mut matched: Vec<SendTask> = self
            .tasks
            .read()?
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();

        matched.sort_by(|a, b| order.compare(a, b));

        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, status: TaskStatus) -> crate::Result<usize> {
        Ok(self
            .tasks
            .read()?
            .values()
            .filter(|task| task.status == status)
            .count())
    }

    async fn delete(&self, id: &TaskId) -> crate::Result<()> {
        self.tasks
            .write()?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(())
    }

    async fn delete_many(&self, filter: TaskFilter) -> crate::Result<usize> {
        let mut tasks = self.tasks.write()?;
        let before = tasks.len();
        tasks.retain(|_, task| !filter.matches(task));
        Ok(before - tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;
    use chrono::Utc;

    use super::*;
    use crate::task::Priority;

    fn create_task(to: &str) -> SendTask {
        let now = Utc::now();
        SendTask {
            id: TaskId::generate(),
            to: to.to_string(),
            subject: "Test".to_string(),
            content: "<p>Test</p>".to_string(),
            text_content: None,
            template_id: None,
            variables: AHashMap::new(),
            priority: Priority::Normal,
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts: 3,
            scheduled_at: now,
            sent_at: None,
            error: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemoryTaskStore::new();
        let task = create_task("user@example.com");
        let id = task.id.clone();

        store.insert(task).await.expect("Failed to insert");
        assert_eq!(store.len(), 1);

        let read_back = store.get(&id).await.expect("Failed to get");
        assert_eq!(read_back.to, "user@example.com");
        assert_eq!(read_back.status, TaskStatus::Pending);

        store.delete(&id).await.expect("Failed to delete");
        assert!(store.is_empty());
        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_capacity_limit() {
        let store = MemoryTaskStore::with_capacity(2);

        store
            .insert(create_task("one@example.com"))
            .await
            .expect("First insert should succeed");
        store
            .insert(create_task("two@example.com"))
            .await
            .expect("Second insert should succeed");

        let result = store.insert(create_task("three@example.com")).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("capacity exceeded")
        );
    }

    #[tokio::test]
    async fn test_update_atomic_applies_on_expected_status() {
        let store = MemoryTaskStore::new();
        let task = create_task("user@example.com");
        let id = task.id.clone();
        store.insert(task).await.expect("Failed to insert");

        let claimed = store
            .update_atomic(&id, TaskStatus::Pending, TaskPatch::claim())
            .await
            .expect("Failed to update");
        assert!(claimed);

        let task = store.get(&id).await.expect("Failed to get");
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.attempts, 1);
    }

    #[tokio::test]
    async fn test_update_atomic_noops_on_status_mismatch() {
        let store = MemoryTaskStore::new();
        let task = create_task("user@example.com");
        let id = task.id.clone();
        store.insert(task).await.expect("Failed to insert");

        // First claim wins
        assert!(
            store
                .update_atomic(&id, TaskStatus::Pending, TaskPatch::claim())
                .await
                .expect("Failed to update")
        );

        // Second claim loses the race: no-op, not an error
        assert!(
            !store
                .update_atomic(&id, TaskStatus::Pending, TaskPatch::claim())
                .await
                .expect("Failed to update")
        );

        let task = store.get(&id).await.expect("Failed to get");
        assert_eq!(task.attempts, 1, "Lost race must not increment attempts");
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = create_task("user@example.com");
        let id = task.id.clone();
        store.insert(task).await.expect("Failed to insert");

        let mut handles = vec![];
        for _ in 0..20 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_atomic(&id, TaskStatus::Pending, TaskPatch::claim())
                    .await
                    .expect("Update failed")
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.expect("Task panicked") {
                winners += 1;
            }
        }

        assert_eq!(winners, 1, "Exactly one concurrent claim may win");
        let task = store.get(&id).await.expect("Failed to get");
        assert_eq!(task.attempts, 1);
    }

    #[tokio::test]
    async fn test_find_many_filters_sorts_and_paginates() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();

        let mut high = create_task("high@example.com");
        high.priority = Priority::High;
        high.created_at = now;
        high.scheduled_at = now;
        let mut old_normal = create_task("old@example.com");
        old_normal.created_at = now - chrono::Duration::minutes(10);
        old_normal.scheduled_at = now;
        let mut new_normal = create_task("new@example.com");
        new_normal.created_at = now;
        new_normal.scheduled_at = now;
        let mut sent = create_task("sent@example.com");
        sent.status = TaskStatus::Sent;
        sent.sent_at = Some(now);

        for task in [&high, &old_normal, &new_normal, &sent] {
            store.insert(task.clone()).await.expect("Failed to insert");
        }

        let claimable = store
            .find_many(
                TaskFilter::claimable(now),
                TaskOrder::PriorityThenAge,
                10,
                0,
            )
            .await
            .expect("Failed to query");
        assert_eq!(claimable.len(), 3);
        assert_eq!(claimable[0].id, high.id);
        assert_eq!(claimable[1].id, old_normal.id);

        let page = store
            .find_many(TaskFilter::default(), TaskOrder::CreatedAsc, 2, 1)
            .await
            .expect("Failed to query");
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_many_returns_count() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();

        let mut old_sent = create_task("old@example.com");
        old_sent.status = TaskStatus::Sent;
        old_sent.sent_at = Some(now - chrono::Duration::days(40));
        let mut recent_sent = create_task("recent@example.com");
        recent_sent.status = TaskStatus::Sent;
        recent_sent.sent_at = Some(now - chrono::Duration::days(5));

        store.insert(old_sent).await.expect("Failed to insert");
        store.insert(recent_sent).await.expect("Failed to insert");

        let deleted = store
            .delete_many(TaskFilter::sent_older_than(now - chrono::Duration::days(30)))
            .await
            .expect("Failed to delete");
        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_id_generation() {
        let store = Arc::new(MemoryTaskStore::new());

        let mut handles = vec![];
        for i in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(create_task(&format!("user{i}@example.com"))).await
            }));
        }

        for handle in handles {
            handle.await.expect("Task panicked").expect("Insert failed");
        }

        assert_eq!(store.len(), 100);
    }
}

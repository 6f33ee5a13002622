//! The queue service: task lifecycle operations
//!
//! The claim-and-process pass itself lives in `process.rs`; this module
//! holds construction, enqueueing, and the read/maintenance operations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use outbox_store::{SendTask, TaskFilter, TaskId, TaskOrder, TaskPatch, TaskStatus, TaskStore};
use outbox_template::TemplateRegistry;
use outbox_transport::Transport;

use crate::{
    QueueError,
    types::{EnqueueRequest, QueueConfig, QueueStats},
};

/// Owns the send-task lifecycle
///
/// Explicitly constructed and injected into whatever hosts it; there is no
/// hidden module-level instance, so tests (and processes that want several
/// independent queues) just build their own.
#[derive(Debug, Clone)]
pub struct QueueService {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) templates: Arc<TemplateRegistry>,
    pub(crate) config: QueueConfig,
}

impl QueueService {
    /// Create a queue service over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn TaskStore>,
        transport: Arc<dyn Transport>,
        templates: Arc<TemplateRegistry>,
        config: QueueConfig,
    ) -> Self {
        Self {
            store,
            transport,
            templates,
            config,
        }
    }

    /// Enqueue one email, returning the new task's id
    ///
    /// The destination is not validated for deliverability here; the SMTP
    /// server is the source of truth, and a bad address simply fails its
    /// sends. When the request names a template that is not registered the
    /// task is still enqueued; the render error surfaces at send time and
    /// consumes attempts like any other failure, which keeps enqueue
    /// infallible except for storage.
    ///
    /// # Errors
    /// Only on storage unavailability; no task is created then.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<TaskId, QueueError> {
        let now = Utc::now();

        if let Some(template_id) = &request.template_id
            && !self.templates.contains(template_id)
        {
            warn!(
                template_id = %template_id,
                "Enqueueing task for unregistered template; sends will fail until it is registered"
            );
        }

        let task = SendTask {
            id: TaskId::generate(),
            to: request.to,
            subject: request.subject,
            content: request.content,
            text_content: request.text_content,
            template_id: request.template_id,
            variables: request.variables,
            priority: request.priority,
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts: request.max_attempts.unwrap_or(self.config.max_attempts),
            scheduled_at: request.scheduled_at.unwrap_or(now),
            sent_at: None,
            error: None,
            created_at: now,
        };
        let id = task.id.clone();

        self.store.insert(task).await?;
        debug!(task_id = %id, "Task enqueued");

        Ok(id)
    }

    /// Enqueue several emails sequentially
    ///
    /// Not atomic as a whole: a storage failure partway through leaves the
    /// earlier tasks enqueued. That partial success is a deliberate
    /// simplicity/throughput tradeoff; callers needing all-or-nothing must
    /// provide it themselves.
    ///
    /// # Errors
    /// The first storage failure aborts the remainder.
    pub async fn enqueue_batch(
        &self,
        requests: Vec<EnqueueRequest>,
    ) -> Result<Vec<TaskId>, QueueError> {
        let mut ids = Vec::with_capacity(requests.len());
        for request in requests {
            ids.push(self.enqueue(request).await?);
        }
        Ok(ids)
    }

    /// Read a single task (its status, attempts, and last error)
    ///
    /// # Errors
    /// `NotFound` if no such task exists, or on storage unavailability.
    pub async fn get_task_status(&self, id: &TaskId) -> Result<SendTask, QueueError> {
        Ok(self.store.get(id).await?)
    }

    /// List tasks, optionally filtered by status, oldest first
    ///
    /// # Errors
    /// On storage unavailability.
    pub async fn get_queue_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SendTask>, QueueError> {
        let filter = status.map_or_else(TaskFilter::default, TaskFilter::with_status);
        Ok(self
            .store
            .find_many(filter, TaskOrder::CreatedAsc, limit, offset)
            .await?)
    }

    /// Point-in-time queue counts
    ///
    /// # Errors
    /// On storage unavailability.
    pub async fn get_queue_stats(&self) -> Result<QueueStats, QueueError> {
        let pending = self.store.count(TaskStatus::Pending).await?;
        let processing = self.store.count(TaskStatus::Processing).await?;
        let sent = self.store.count(TaskStatus::Sent).await?;
        let failed = self.store.count(TaskStatus::Failed).await?;

        Ok(QueueStats {
            pending,
            processing,
            sent,
            failed,
            total: pending + processing + sent + failed,
        })
    }

    /// Reset retryable Failed tasks to Pending, immediately due
    ///
    /// Selects Failed tasks with `attempts < max_attempts`. Note that the
    /// failure handler only marks a task Failed once its attempts reach the
    /// ceiling, so this selection is empty unless something outside the
    /// normal lifecycle (a manual row edit, a raised ceiling) produced such
    /// a row. The operation is kept as the documented administrative
    /// escape hatch for exactly those cases.
    ///
    /// # Errors
    /// On storage unavailability during selection.
    pub async fn retry_failed_tasks(&self) -> Result<usize, QueueError> {
        let candidates = self
            .store
            .find_many(
                TaskFilter::failed_with_headroom(),
                TaskOrder::CreatedAsc,
                usize::MAX,
                0,
            )
            .await?;

        let now = Utc::now();
        let mut reset = 0;
        for task in candidates {
            if self
                .store
                .update_atomic(&task.id, TaskStatus::Failed, TaskPatch::reset(now))
                .await?
            {
                reset += 1;
            }
        }

        if reset > 0 {
            info!(count = reset, "Reset failed tasks to pending");
        }
        Ok(reset)
    }

    /// Delete Sent tasks whose `sent_at` is older than `days_to_keep` days
    ///
    /// Pending, Processing, and Failed rows are never swept regardless of
    /// age; failed rows in particular stay visible until an operator deals
    /// with them.
    ///
    /// # Errors
    /// On storage unavailability.
    pub async fn cleanup_old_tasks(&self, days_to_keep: u32) -> Result<usize, QueueError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
        let deleted = self
            .store
            .delete_many(TaskFilter::sent_older_than(cutoff))
            .await?;

        if deleted > 0 {
            info!(deleted, days_to_keep, "Swept old sent tasks");
        }
        Ok(deleted)
    }

    /// Delete a single task unconditionally
    ///
    /// # Errors
    /// `NotFound` if no such task exists, or on storage unavailability.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), QueueError> {
        self.store.delete(id).await?;
        debug!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// The configured attempt ceiling for new tasks
    #[must_use]
    pub const fn default_max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

//! The claim-and-process pass
//!
//! One pass selects due work in claim order and walks it sequentially,
//! never in parallel. One slow conversation delays the rest of the batch
//! until the send timeout fires.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use outbox_store::{SendTask, TaskFilter, TaskId, TaskOrder, TaskPatch, TaskStatus};
use outbox_transport::OutboundEmail;

use crate::{
    QueueError,
    error::SendFailure,
    service::QueueService,
    types::BatchOutcome,
};

impl QueueService {
    /// Claim up to `limit` due tasks and work them to completion
    ///
    /// Selection: Pending, due, below their attempt ceiling; high priority
    /// first, oldest first within a tier. Each selected task is claimed with
    /// the store's conditional update; a task another processor claimed in
    /// the meantime no-ops out of this pass, so the call is safe to invoke
    /// concurrently and repeatedly.
    ///
    /// Per-task failures (render, transport, timeout) are recorded on the
    /// task row and reflected in the counts; they never escape this call.
    ///
    /// # Errors
    /// Only if the initial selection query fails (store unavailable).
    pub async fn claim_and_process_batch(&self, limit: usize) -> Result<BatchOutcome, QueueError> {
        let now = Utc::now();
        let due = self
            .store
            .find_many(
                TaskFilter::claimable(now),
                TaskOrder::PriorityThenAge,
                limit,
                0,
            )
            .await?;

        if due.is_empty() {
            debug!("No due tasks to process");
            return Ok(BatchOutcome::default());
        }

        debug!(count = due.len(), "Processing due tasks");
        let mut outcome = BatchOutcome::default();

        for task in due {
            // The claim: Pending -> Processing, attempts += 1. Losing the
            // race to a concurrent pass is a normal outcome, not a failure.
            let claimed = match self
                .store
                .update_atomic(&task.id, TaskStatus::Pending, TaskPatch::claim())
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Store error while claiming task");
                    continue;
                }
            };
            if !claimed {
                debug!(task_id = %task.id, "Task claimed elsewhere, skipping");
                continue;
            }

            outcome.processed += 1;

            match self.send_one(&task).await {
                Ok(()) => {
                    outcome.succeeded += 1;
                }
                Err(failure) => {
                    outcome.failed += 1;
                    self.mark_failed_or_retry(&task.id, &failure.to_string())
                        .await;
                }
            }
        }

        info!(
            processed = outcome.processed,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch complete"
        );
        Ok(outcome)
    }

    /// Render (if templated), send, and mark one claimed task as Sent
    async fn send_one(&self, task: &SendTask) -> Result<(), SendFailure> {
        let email = self.build_email(task)?;

        let timeout = Duration::from_secs(self.config.send_timeout_secs);
        let receipt = match tokio::time::timeout(timeout, self.transport.send(&email)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SendFailure::Timeout {
                    timeout_secs: self.config.send_timeout_secs,
                });
            }
        };

        let sent_at = Utc::now();
        match self
            .store
            .update_atomic(&task.id, TaskStatus::Processing, TaskPatch::sent(sent_at))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // The send already happened; only the bookkeeping is lost.
                warn!(task_id = %task.id, "Task status changed during send; Sent mark skipped");
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Store error while marking task sent");
            }
        }

        debug!(
            task_id = %task.id,
            message_id = receipt.message_id.as_deref().unwrap_or("-"),
            "Task sent"
        );
        Ok(())
    }

    /// Produce the final message for a task, rendering its template if any
    fn build_email(&self, task: &SendTask) -> Result<OutboundEmail, SendFailure> {
        let Some(template_id) = &task.template_id else {
            let mut email = OutboundEmail::new(&task.to, &task.subject, &task.content);
            if let Some(text) = &task.text_content {
                email = email.with_text(text);
            }
            return Ok(email);
        };

        for name in self.templates.required_variables(template_id)? {
            if !task.variables.contains_key(&name) {
                // Missing variables render as empty rather than failing.
                warn!(task_id = %task.id, template_id = %template_id, variable = %name,
                    "Template variable not supplied");
            }
        }
        let rendered = self.templates.render(template_id, &task.variables)?;
        let mut email = OutboundEmail::new(&task.to, rendered.subject, rendered.html);
        if let Some(text) = rendered.text {
            email = email.with_text(text);
        }
        Ok(email)
    }

    /// Route a failed attempt: retry with the configured policy, or fail
    /// terminally once the attempt ceiling is reached
    ///
    /// Re-reads the row for current attempt counts rather than trusting the
    /// pre-claim snapshot. Store errors here are logged and swallowed; the
    /// task stays Processing and is invisible to future claims until an
    /// operator intervenes.
    pub(crate) async fn mark_failed_or_retry(&self, id: &TaskId, message: &str) {
        let task = match self.store.get(id).await {
            Ok(task) => task,
            Err(e) => {
                error!(task_id = %id, error = %e, "Store error while handling send failure");
                return;
            }
        };

        let patch = if task.attempts >= task.max_attempts {
            warn!(
                task_id = %id,
                attempts = task.attempts,
                error = %message,
                "Task failed terminally"
            );
            TaskPatch::failed(message)
        } else {
            let at = self.config.retry.next_attempt_at(task.attempts, Utc::now());
            debug!(
                task_id = %id,
                attempt = task.attempts,
                retry_at = %at,
                error = %message,
                "Task send failed, rescheduling"
            );
            TaskPatch::retry(message, at)
        };

        match self
            .store
            .update_atomic(id, TaskStatus::Processing, patch)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(task_id = %id, "Task status changed during failure handling");
            }
            Err(e) => {
                error!(task_id = %id, error = %e, "Store error while recording send failure");
            }
        }
    }
}

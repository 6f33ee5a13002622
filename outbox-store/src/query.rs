//! Query model for filtered task lookups

use chrono::{DateTime, Utc};

use crate::task::{SendTask, TaskStatus};

/// Row filter for `find_many` / `delete_many`
///
/// All set fields must match (conjunction). The named constructors cover the
/// queries the queue service actually issues.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Match this status exactly
    pub status: Option<TaskStatus>,
    /// Match tasks due at or before this instant (`scheduled_at <= t`)
    pub due_at: Option<DateTime<Utc>>,
    /// Match only tasks with `attempts < max_attempts`
    pub below_max_attempts: bool,
    /// Match tasks sent strictly before this instant
    pub sent_before: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Everything that may be claimed at `now`: pending, due, attempts left
    #[must_use]
    pub fn claimable(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            due_at: Some(now),
            below_max_attempts: true,
            ..Self::default()
        }
    }

    /// All tasks with the given status
    #[must_use]
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Sent tasks whose `sent_at` is older than `cutoff` (retention sweep)
    #[must_use]
    pub fn sent_older_than(cutoff: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Sent),
            sent_before: Some(cutoff),
            ..Self::default()
        }
    }

    /// Failed tasks that still have attempt headroom
    ///
    /// Used by the administrative retry operation. Normally empty by
    /// construction, since Failed is only reached at the attempt ceiling.
    #[must_use]
    pub fn failed_with_headroom() -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            below_max_attempts: true,
            ..Self::default()
        }
    }

    /// Whether `task` satisfies every set field of this filter
    #[must_use]
    pub fn matches(&self, task: &SendTask) -> bool {
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        if let Some(due_at) = self.due_at
            && task.scheduled_at > due_at
        {
            return false;
        }
        if self.below_max_attempts && task.attempts >= task.max_attempts {
            return false;
        }
        if let Some(sent_before) = self.sent_before {
            match task.sent_at {
                Some(sent_at) if sent_at < sent_before => {}
                _ => return false,
            }
        }
        true
    }
}

/// Row ordering for `find_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOrder {
    /// High priority first; within a tier, oldest `created_at` first.
    /// This is the claim order.
    PriorityThenAge,
    /// Oldest `created_at` first, priority ignored (listing order).
    #[default]
    CreatedAsc,
}

impl TaskOrder {
    /// Comparator for sorting a result set in this order
    #[must_use]
    pub fn compare(self, a: &SendTask, b: &SendTask) -> std::cmp::Ordering {
        match self {
            Self::PriorityThenAge => b
                .priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id)),
            Self::CreatedAsc => a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)),
        }
    }
}

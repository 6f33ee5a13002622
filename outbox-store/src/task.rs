//! The send-task row model and its state machine

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// Delivery priority for a send-task
///
/// `High` tasks are always claimed before `Normal` tasks regardless of age;
/// within a tier, older tasks go first. The derived `Ord` puts `Normal`
/// below `High` so descending priority sorts claim-first tasks to the front.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Lifecycle status of a send-task
///
/// ```text
/// Pending ──claim──▶ Processing ──send ok──▶ Sent (terminal)
///    ▲                   │
///    └──retryable fail───┤
///                        └──attempts == max──▶ Failed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be claimed (possibly scheduled for the future).
    Pending,
    /// Claimed by a processing pass; a send is in flight.
    Processing,
    /// Delivered successfully. Terminal.
    Sent,
    /// Exhausted its attempts. Terminal.
    Failed,
}

impl TaskStatus {
    /// Whether this status is terminal (never claimed again automatically)
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// One email waiting to be (or already) delivered
///
/// Rows are append-mutated only by the queue service, via
/// [`TaskPatch`] through the store's conditional update. `created_at` is the
/// tie-break ordering key within a priority tier and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTask {
    /// Unique identifier, generated at creation
    pub id: TaskId,
    /// Destination address (presence required, deliverability not validated
    /// here; the SMTP server is the source of truth)
    pub to: String,
    /// Subject line (derived at send time when `template_id` is set)
    pub subject: String,
    /// HTML body (derived at send time when `template_id` is set)
    pub content: String,
    /// Optional plain-text body
    pub text_content: Option<String>,
    /// When set, subject/content are rendered from this template at send time
    pub template_id: Option<String>,
    /// Variable bag passed to the template renderer
    #[serde(default)]
    pub variables: AHashMap<String, String>,
    /// Claim priority
    pub priority: Priority,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Number of claim-and-send attempts made so far
    pub attempts: u32,
    /// Attempt ceiling, fixed at creation
    pub max_attempts: u32,
    /// Not eligible for claim until this instant
    pub scheduled_at: DateTime<Utc>,
    /// Set if and only if `status == Sent`
    pub sent_at: Option<DateTime<Utc>>,
    /// Last failure message; retained across retries, cleared on success
    pub error: Option<String>,
    /// Immutable creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Partial update applied through [`TaskStore::update_atomic`]
///
/// Only the fields the queue service is allowed to touch are representable;
/// `error` distinguishes "leave alone" (`None`) from "clear" and "set".
///
/// [`TaskStore::update_atomic`]: crate::TaskStore::update_atomic
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub increment_attempts: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<Option<String>>,
}

impl TaskPatch {
    /// The claim step: Pending → Processing, attempts += 1
    #[must_use]
    pub fn claim() -> Self {
        Self {
            status: Some(TaskStatus::Processing),
            increment_attempts: true,
            ..Self::default()
        }
    }

    /// Transport success: Processing → Sent, stamp `sent_at`, clear `error`
    #[must_use]
    pub fn sent(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Sent),
            sent_at: Some(at),
            error: Some(None),
            ..Self::default()
        }
    }

    /// Retryable failure: back to Pending, record the error, reschedule
    #[must_use]
    pub fn retry(error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            scheduled_at: Some(at),
            error: Some(Some(error.into())),
            ..Self::default()
        }
    }

    /// Terminal failure: attempts exhausted, record the last error
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error: Some(Some(error.into())),
            ..Self::default()
        }
    }

    /// Administrative reset: Failed → Pending, immediately due, error kept
    #[must_use]
    pub fn reset(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            scheduled_at: Some(at),
            ..Self::default()
        }
    }

    /// Apply this patch to a task row
    ///
    /// Backends call this while holding whatever makes the conditional
    /// update atomic for them.
    pub fn apply(&self, task: &mut SendTask) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if self.increment_attempts {
            task.attempts = task.attempts.saturating_add(1);
        }
        if let Some(scheduled_at) = self.scheduled_at {
            task.scheduled_at = scheduled_at;
        }
        if let Some(sent_at) = self.sent_at {
            task.sent_at = Some(sent_at);
        }
        if let Some(error) = &self.error {
            task.error.clone_from(error);
        }
    }
}

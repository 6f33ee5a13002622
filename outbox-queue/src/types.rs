//! Type definitions for the queue service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outbox_store::Priority;
use outbox_template::Variables;

use crate::retry::RetryPolicy;

const fn default_max_attempts() -> u32 {
    3
}

const fn default_send_timeout() -> u64 {
    30
}

/// Queue service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Attempt ceiling stamped on newly enqueued tasks
    ///
    /// Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single transport send (in seconds)
    ///
    /// Batches are processed sequentially, so without this bound one hung
    /// SMTP conversation stalls the whole batch. A timeout counts as a send
    /// failure and consumes an attempt.
    ///
    /// Default: 30 seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// How failed tasks are rescheduled
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            send_timeout_secs: default_send_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Configuration with every field at its documented default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// One email to enqueue
///
/// Either carry literal `subject`/`content`, or set `template_id` and let
/// the renderer derive all parts from `variables` at send time.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    /// Destination address
    pub to: String,
    /// Subject line (ignored at send time when `template_id` is set)
    #[serde(default)]
    pub subject: String,
    /// HTML body (ignored at send time when `template_id` is set)
    #[serde(default)]
    pub content: String,
    /// Optional plain-text body
    #[serde(default)]
    pub text_content: Option<String>,
    /// Render from this template at send time
    #[serde(default)]
    pub template_id: Option<String>,
    /// Variable bag for the template
    #[serde(default)]
    pub variables: Variables,
    /// Claim priority
    #[serde(default)]
    pub priority: Priority,
    /// Earliest send time; omit for immediate
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Per-task override of the configured attempt ceiling
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl EnqueueRequest {
    /// An email with literal subject and HTML content
    #[must_use]
    pub fn direct(
        to: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            content: content.into(),
            text_content: None,
            template_id: None,
            variables: Variables::new(),
            priority: Priority::Normal,
            scheduled_at: None,
            max_attempts: None,
        }
    }

    /// An email rendered from a registered template at send time
    #[must_use]
    pub fn templated(to: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: String::new(),
            content: String::new(),
            text_content: None,
            template_id: Some(template_id.into()),
            variables: Variables::new(),
            priority: Priority::Normal,
            scheduled_at: None,
            max_attempts: None,
        }
    }

    /// Add a template variable
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Set the claim priority
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Defer the earliest send time
    #[must_use]
    pub const fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Override the attempt ceiling for this task only
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Add a plain-text body
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }
}

/// Aggregate result of one claim-and-process pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Tasks claimed and worked in this pass
    pub processed: usize,
    /// Tasks that reached Sent
    pub succeeded: usize,
    /// Tasks routed through the failure handler
    pub failed: usize,
}

/// Point-in-time queue counts
///
/// Assembled from separate counting queries with no snapshot isolation, so
/// concurrent mutation can skew individual numbers; treat it as an
/// eventually-consistent dashboard figure, not an invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_config_defaults() {
        let config = QueueConfig::new();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.send_timeout_secs, 30);
        assert_eq!(config.retry, RetryPolicy::Immediate);
    }

    #[test]
    fn test_queue_config_empty_toml_uses_defaults() {
        let config: QueueConfig = toml::from_str("").expect("Failed to deserialize");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.send_timeout_secs, 30);
    }

    #[test]
    fn test_enqueue_request_builders() {
        let request = EnqueueRequest::templated("user@example.com", "welcome")
            .variable("name", "Ada")
            .priority(Priority::High)
            .max_attempts(1);

        assert_eq!(request.template_id.as_deref(), Some("welcome"));
        assert_eq!(request.variables.get("name").map(String::as_str), Some("Ada"));
        assert_eq!(request.priority, Priority::High);
        assert_eq!(request.max_attempts, Some(1));
    }
}

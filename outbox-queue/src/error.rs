//! Typed error handling for queue operations.
//!
//! Two kinds of failure live here and they propagate differently:
//! - [`QueueError`] escapes a service call. Per the propagation policy,
//!   only store-level failures do this (the batch selection query, an
//!   enqueue insert); everything that goes wrong while working a single
//!   task is recorded on that task's row instead.
//! - [`SendFailure`] is the per-task kind: render errors, transport
//!   rejections, and send timeouts. It never crosses the service boundary;
//!   it becomes the task's `error` string and an attempt is consumed.

use thiserror::Error;

use outbox_template::RenderError;
use outbox_transport::TransportError;

/// Errors that escape queue service calls.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The task store failed the operation itself.
    #[error(transparent)]
    Store(#[from] outbox_store::StoreError),
}

/// A single task's send attempt failed.
///
/// Routed into the failure handler, which records the message on the task
/// row and either reschedules or fails the task terminally.
#[derive(Debug, Error)]
pub enum SendFailure {
    /// Template rendering failed (unknown template id).
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// The transport reported a failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The transport call exceeded the configured send timeout.
    #[error("Send timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failure_display() {
        let failure = SendFailure::Render(RenderError::UnknownTemplate("welcome".to_string()));
        assert_eq!(failure.to_string(), "Render failed: Unknown template: welcome");
    }

    #[test]
    fn test_timeout_display() {
        let failure = SendFailure::Timeout { timeout_secs: 30 };
        assert_eq!(failure.to_string(), "Send timed out after 30s");
    }

    #[test]
    fn test_transport_failure_is_transparent() {
        let failure = SendFailure::Transport(TransportError::Connection(
            "connection refused".to_string(),
        ));
        assert_eq!(failure.to_string(), "Connection failed: connection refused");
    }
}

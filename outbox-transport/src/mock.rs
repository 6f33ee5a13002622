//! Scriptable transport for tests

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{Receipt, Transport, TransportError, message::OutboundEmail};

enum Outcome {
    Success,
    Failure(String),
}

/// Transport test double with scripted outcomes
///
/// Every send is recorded. Outcomes are consumed from a script queue; when
/// the script runs dry the mock succeeds, so the common case (everything
/// delivers) needs no setup and a test only scripts the failures it wants.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    script: Mutex<VecDeque<Outcome>>,
    sent: Mutex<Vec<OutboundEmail>>,
    notify: Notify,
}

impl std::fmt::Debug for MockInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInner")
            .field("sent", &self.sent_len())
            .finish_non_exhaustive()
    }
}

impl MockInner {
    fn sent_len(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl MockTransport {
    /// Create a mock that succeeds on every send
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next outcome as a failure with this message
    pub fn push_failure(&self, message: impl Into<String>) {
        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Outcome::Failure(message.into()));
    }

    /// Script the next outcome as a success
    pub fn push_success(&self) {
        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Outcome::Success);
    }

    /// Script `n` consecutive failures
    pub fn fail_times(&self, n: usize, message: impl Into<String>) {
        let message = message.into();
        for _ in 0..n {
            self.push_failure(message.clone());
        }
    }

    /// Every email handed to `send` so far, including failed ones
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.inner
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of send calls so far
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.inner.sent_len()
    }

    /// Wait for the next send call to happen
    pub async fn wait_for_send(&self) {
        self.inner.notify.notified().await;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<Receipt, TransportError> {
        self.inner
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        self.inner.notify.notify_waiters();

        let outcome = self
            .inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match outcome {
            None | Some(Outcome::Success) => Ok(Receipt {
                message_id: Some(format!("mock-{}", self.inner.sent_len())),
            }),
            Some(Outcome::Failure(message)) => Err(TransportError::Smtp {
                permanent: false,
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutboundEmail {
        OutboundEmail::new("user@example.com", "Subject", "<p>Body</p>")
    }

    #[tokio::test]
    async fn test_default_is_success() {
        let mock = MockTransport::new();
        let receipt = mock.send(&email()).await.expect("Should succeed");
        assert!(receipt.message_id.is_some());
        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures_then_success() {
        let mock = MockTransport::new();
        mock.fail_times(2, "421 busy");

        assert!(mock.send(&email()).await.is_err());
        assert!(mock.send(&email()).await.is_err());
        assert!(mock.send(&email()).await.is_ok());
        assert_eq!(mock.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_records_message_content() {
        let mock = MockTransport::new();
        mock.send(&email().with_text("plain"))
            .await
            .expect("Should succeed");

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.com");
        assert_eq!(sent[0].text.as_deref(), Some("plain"));
    }
}

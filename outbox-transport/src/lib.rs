//! SMTP transport client for outbound delivery
//!
//! The queue service talks to a [`Transport`]: one `send` call per email, a
//! [`Receipt`] on success, a categorized [`TransportError`] on failure. No
//! retry happens here; all retry policy lives in the queue service.
//! Connection pooling and outbound rate limiting are internal to the SMTP
//! implementation and opaque to callers.

pub mod error;
pub mod message;
pub mod mock;
pub mod smtp;

use async_trait::async_trait;

pub use error::{Receipt, TransportError};
pub use message::OutboundEmail;
pub use mock::MockTransport;
pub use smtp::{SmtpConfig, SmtpSecurity, SmtpTransport};

/// A one-shot email sender
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a single email
    ///
    /// # Errors
    /// Any connection, protocol, or message-build failure. The error is
    /// final from this trait's point of view; whether to try again is the
    /// caller's decision.
    async fn send(&self, email: &OutboundEmail) -> Result<Receipt, TransportError>;
}

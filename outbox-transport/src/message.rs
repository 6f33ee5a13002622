//! The outbound message type handed to a transport

use serde::{Deserialize, Serialize};

/// A fully-rendered email ready to send
///
/// Templates have already been applied by the time one of these exists; the
/// transport sees only final strings. The sender address is the transport's
/// concern (it comes from [`SmtpConfig`](crate::SmtpConfig)), so it does
/// not appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Destination address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Optional plain-text alternative
    pub text: Option<String>,
}

impl OutboundEmail {
    /// Create an HTML-only email
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            text: None,
        }
    }

    /// Add a plain-text alternative body
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

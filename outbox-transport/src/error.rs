//! Typed error handling for transport operations.

use thiserror::Error;

/// Successful send acknowledgement
///
/// `message_id` carries whatever identifier the server handed back in its
/// acceptance line, when one was present.
#[derive(Debug, Clone, Default)]
pub struct Receipt {
    pub message_id: Option<String>,
}

/// Transport failure categories.
///
/// The split matters to operators reading a task's recorded error, not to
/// the queue's retry logic; every transport failure consumes one attempt
/// regardless of category.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach or keep a connection to the server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server answered with a rejection.
    #[error("SMTP rejection: {message}")]
    Smtp {
        /// 5xx responses are permanent, 4xx transient
        permanent: bool,
        message: String,
    },

    /// The message itself could not be built (bad address syntax, etc.).
    #[error("Message build failed: {0}")]
    Message(String),
}

impl From<lettre::transport::smtp::Error> for TransportError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        if error.is_permanent() {
            Self::Smtp {
                permanent: true,
                message: error.to_string(),
            }
        } else if error.is_transient() {
            Self::Smtp {
                permanent: false,
                message: error.to_string(),
            }
        } else {
            Self::Connection(error.to_string())
        }
    }
}

impl From<lettre::error::Error> for TransportError {
    fn from(error: lettre::error::Error) -> Self {
        Self::Message(error.to_string())
    }
}

impl From<lettre::address::AddressError> for TransportError {
    fn from(error: lettre::address::AddressError) -> Self {
        Self::Message(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_rejection_display() {
        let error = TransportError::Smtp {
            permanent: true,
            message: "550 user unknown".to_string(),
        };
        assert_eq!(error.to_string(), "SMTP rejection: 550 user unknown");
    }

    #[test]
    fn test_transient_rejection_display() {
        let error = TransportError::Smtp {
            permanent: false,
            message: "421 try again later".to_string(),
        };
        assert_eq!(error.to_string(), "SMTP rejection: 421 try again later");
    }

    #[test]
    fn test_connection_display() {
        let error = TransportError::Connection("connection refused".to_string());
        assert!(error.to_string().contains("connection refused"));
    }
}

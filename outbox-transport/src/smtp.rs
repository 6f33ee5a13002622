//! lettre-backed SMTP transport with connection pooling

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message, MultiPart, header::ContentType},
    transport::smtp::{PoolConfig, authentication::Credentials},
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{Receipt, Transport, TransportError, message::OutboundEmail};

const fn default_port() -> u16 {
    587
}

const fn default_timeout() -> u64 {
    30
}

const fn default_pool_size() -> u32 {
    4
}

/// SMTP connection security mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// No encryption (port 25, not recommended)
    None,
    /// STARTTLS upgrade (port 587)
    #[default]
    StartTls,
    /// Implicit TLS (port 465)
    Tls,
}

/// SMTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host
    pub host: String,

    /// SMTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection security mode
    #[serde(default)]
    pub security: SmtpSecurity,

    /// Sender address placed on every outbound message
    pub from: String,

    /// Username for authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Connection timeout (in seconds)
    ///
    /// Default: 30 seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum pooled connections
    ///
    /// Default: 4
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl SmtpConfig {
    /// Create a configuration for `host` with the defaults above
    #[must_use]
    pub fn new(host: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            security: SmtpSecurity::default(),
            from: from.into(),
            username: None,
            password: None,
            timeout_secs: default_timeout(),
            pool_size: default_pool_size(),
        }
    }

    /// Set credentials
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Pooled SMTP transport
///
/// Wraps lettre's async SMTP transport. The pool and any server-imposed
/// rate limiting are invisible to callers; the queue service simply calls
/// `send` one message at a time.
#[derive(Debug)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    /// If the sender address does not parse or TLS parameters cannot be
    /// established for the host.
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| TransportError::Message(format!("invalid from address: {e}")))?;

        let mut builder = match config.security {
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .pool_config(PoolConfig::new().max_size(config.pool_size));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        info!(
            host = %config.host,
            port = config.port,
            security = ?config.security,
            pool_size = config.pool_size,
            "SMTP transport initialized"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, TransportError> {
        let to: Mailbox = email.to.parse()?;
        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject);

        let message = match &email.text {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.clone(),
                email.html.clone(),
            ))?,
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(email.html.clone())?,
        };

        Ok(message)
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<Receipt, TransportError> {
        let message = self.build_message(email)?;

        debug!(to = %email.to, subject = %email.subject, "Sending email via SMTP");

        let response = self.transport.send(message).await?;

        debug!(code = %response.code(), "Email accepted by server");

        Ok(Receipt {
            message_id: response.first_line().map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SmtpConfig::new("smtp.example.com", "noreply@example.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.security, SmtpSecurity::StartTls);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pool_size, 4);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_config_deserialization() {
        let config: SmtpConfig = toml::from_str(
            r#"
            host = "smtp.example.com"
            from = "noreply@example.com"
            security = "tls"
            port = 465
        "#,
        )
        .expect("Failed to deserialize");
        assert_eq!(config.security, SmtpSecurity::Tls);
        assert_eq!(config.port, 465);
        assert_eq!(config.pool_size, 4, "Omitted field takes its default");
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let config = SmtpConfig::new("smtp.example.com", "not an address");
        assert!(matches!(
            SmtpTransport::new(&config),
            Err(TransportError::Message(_))
        ));
    }
}

//! Durable, retryable email delivery
//!
//! Emails are enqueued as tasks in a store, then claimed and sent by a
//! timer-driven processor. Tasks carry a priority, an attempt ceiling, and
//! a schedule; failures are retried under a configurable policy until the
//! ceiling is reached. The pieces live in their own crates and this one
//! ties them together:
//!
//! - `outbox-store`: the task row model and the `TaskStore` trait
//! - `outbox-template`: `{{variable}}` substitution for email templates
//! - `outbox-transport`: the `Transport` trait and its SMTP implementation
//! - `outbox-queue`: the queue service and background processor
//!
//! ```no_run
//! use outbox::{Config, EnqueueRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_config("./outbox.config.toml")?;
//! let (service, processor) = config.build()?;
//!
//! processor.start().await;
//! service
//!     .enqueue(EnqueueRequest::direct(
//!         "user@example.com",
//!         "Hello",
//!         "<p>Hello!</p>",
//!     ))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;

pub use config::{BuildError, Config, StoreConfig};
pub use outbox_queue::{
    BatchOutcome, EnqueueRequest, Processor, ProcessorConfig, ProcessorStatus, QueueConfig,
    QueueError, QueueService, QueueStats, RetryPolicy,
};
pub use outbox_store::{
    MemoryTaskStore, Priority, SendTask, StoreError, TaskId, TaskStatus, TaskStore,
};
pub use outbox_template::{Template, TemplateRegistry, Variables};
pub use outbox_transport::{
    OutboundEmail, Receipt, SmtpConfig, SmtpSecurity, SmtpTransport, Transport, TransportError,
};

//! Queue service and processor for outbound email
//!
//! This crate is the core of the outbox: it owns the task lifecycle
//! (enqueue, claim, send, retry, terminal states) and the timer loop that
//! drives it. It composes three collaborators behind traits (the task
//! store, the template registry, and the SMTP transport) and pushes every
//! piece of mutable state into the store, so correctness under concurrent
//! processors rests entirely on the store's atomic conditional update.
//!
//! - Track tasks pending delivery with priority-then-age claim ordering
//! - Manage attempt counters and retry scheduling
//! - Render templated messages at send time
//! - Sweep old sent rows on a probabilistic maintenance tick

mod error;
mod process;
mod processor;
mod retry;
mod service;
mod types;

pub use error::{QueueError, SendFailure};
pub use processor::{Processor, ProcessorConfig, ProcessorStatus};
pub use retry::RetryPolicy;
pub use service::QueueService;
pub use types::{BatchOutcome, EnqueueRequest, QueueConfig, QueueStats};

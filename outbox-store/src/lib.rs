//! Durable storage for outbound send-tasks
//!
//! A send-task is one email waiting to be delivered: destination, content (or
//! a template reference), priority, and the attempt bookkeeping the queue
//! service needs to drive retries. This crate owns the row model and the
//! `TaskStore` trait the queue service talks to; backends decide where the
//! rows actually live.
//!
//! The one hard obligation on every backend is `update_atomic`: the
//! compare-status-and-patch step must be a single atomic read-modify-write,
//! because it is what keeps two concurrent processors from claiming (and
//! sending) the same task twice.

pub mod backends;
pub mod error;
pub mod query;
pub mod task;
pub mod r#trait;
pub mod types;

pub use backends::{MemoryTaskStore, TestTaskStore};
pub use error::{Result, StoreError};
pub use query::{TaskFilter, TaskOrder};
pub use task::{Priority, SendTask, TaskPatch, TaskStatus};
pub use r#trait::TaskStore;
pub use types::TaskId;

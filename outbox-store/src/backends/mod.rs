//! Backend storage implementations for the task store
//!
//! This module contains the available backing store implementations:
//! - `memory`: In-memory storage for testing and transient queues
//! - `test`: Test utilities with synchronization and fault injection
//!
//! Relational backends live behind the same [`TaskStore`](crate::TaskStore)
//! trait; the claim step's atomicity maps onto a conditional `UPDATE ...
//! WHERE status = ?` there.

pub mod memory;

pub use memory::MemoryTaskStore;
pub use test::TestTaskStore;

//! Shared fixtures for queue integration tests
#![allow(dead_code)] // Test utility module - not all helpers used in every test

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use outbox_queue::{QueueConfig, QueueService};
use outbox_store::{Priority, SendTask, TaskId, TaskStatus, TaskStore, TestTaskStore};
use outbox_template::{Template, TemplateRegistry, Variables};
use outbox_transport::MockTransport;

/// A queue service wired to in-memory test doubles
pub struct Harness {
    pub store: TestTaskStore,
    pub transport: MockTransport,
    pub service: QueueService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        let store = TestTaskStore::new();
        let transport = MockTransport::new();

        let mut templates = TemplateRegistry::new();
        templates.register(
            "welcome",
            Template::new("Welcome, {{name}}!", "<p>Hello {{name}}</p>")
                .with_text("Hello {{name}}"),
        );

        let service = QueueService::new(
            Arc::new(store.clone()),
            Arc::new(transport.clone()),
            Arc::new(templates),
            config,
        );

        Self {
            store,
            transport,
            service,
        }
    }

    /// Insert a row directly, bypassing enqueue, for tests that need full
    /// control over timestamps and status
    pub async fn insert(&self, task: SendTask) -> TaskId {
        let id = task.id.clone();
        self.store.insert(task).await.expect("Insert failed");
        id
    }
}

/// A pending row with deterministic timestamps
///
/// `age` pushes `created_at` (and `scheduled_at`) into the past, which makes
/// claim-order assertions independent of clock resolution.
pub fn pending_task(to: &str, priority: Priority, age: Duration) -> SendTask {
    let created = Utc::now() - age;
    SendTask {
        id: TaskId::generate(),
        to: to.to_string(),
        subject: "Subject".to_string(),
        content: "<p>Body</p>".to_string(),
        text_content: None,
        template_id: None,
        variables: Variables::new(),
        priority,
        status: TaskStatus::Pending,
        attempts: 0,
        max_attempts: 3,
        scheduled_at: created,
        sent_at: None,
        error: None,
        created_at: created,
    }
}

/// A sent row whose `sent_at` is `days` days in the past
pub fn sent_task(to: &str, days: i64) -> SendTask {
    let at = Utc::now() - Duration::days(days);
    SendTask {
        status: TaskStatus::Sent,
        attempts: 1,
        sent_at: Some(at),
        created_at: at,
        scheduled_at: at,
        ..pending_task(to, Priority::Normal, Duration::days(days))
    }
}

/// A terminally failed row with attempt headroom left
pub fn failed_task_with_headroom(to: &str) -> SendTask {
    SendTask {
        status: TaskStatus::Failed,
        attempts: 1,
        max_attempts: 3,
        error: Some("550 rejected".to_string()),
        ..pending_task(to, Priority::Normal, Duration::minutes(5))
    }
}

/// Fetch a row through the store, panicking on miss
pub async fn fetch(harness: &Harness, id: &TaskId) -> SendTask {
    harness.store.get(id).await.expect("Task should exist")
}

/// Deferred scheduling helper
pub fn in_the_future(minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(minutes)
}

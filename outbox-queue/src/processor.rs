//! Timer-driven queue processor
//!
//! Runs the claim-and-process pass at a fixed interval on a background
//! task, with an immediate pass at startup so a restart drains backlog
//! without waiting a full interval.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use serde::Deserialize;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::service::QueueService;

const fn default_interval() -> u64 {
    60
}

const fn default_batch_size() -> usize {
    10
}

const fn default_cleanup_probability() -> f64 {
    0.1
}

const fn default_cleanup_days() -> u32 {
    30
}

/// Processor timing and housekeeping configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// How often to run a processing pass (in seconds)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum tasks claimed per pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Chance that a pass also sweeps old sent tasks (0.0 to 1.0)
    ///
    /// Amortizes cleanup over regular passes instead of a dedicated timer.
    #[serde(default = "default_cleanup_probability")]
    pub cleanup_probability: f64,

    /// Age in days past which sent tasks are swept
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            batch_size: default_batch_size(),
            cleanup_probability: default_cleanup_probability(),
            cleanup_days: default_cleanup_days(),
        }
    }
}

/// Snapshot of processor state for operational queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorStatus {
    pub is_running: bool,
    pub interval_secs: u64,
}

/// Handle to a running background loop
#[derive(Debug)]
struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Background processor driving a [`QueueService`]
///
/// `start`/`stop` are idempotent; calling either in the current state is a
/// logged no-op. Dropping the processor aborts nothing on its own; callers
/// that want a clean shutdown await [`Processor::stop`].
#[derive(Debug)]
pub struct Processor {
    service: Arc<QueueService>,
    config: ProcessorConfig,
    running: Mutex<Option<Running>>,
}

impl Processor {
    #[must_use]
    pub fn new(service: Arc<QueueService>, config: ProcessorConfig) -> Self {
        Self {
            service,
            config,
            running: Mutex::new(None),
        }
    }

    /// Start the background loop
    ///
    /// Runs one pass immediately, then every `interval_secs`. A second call
    /// while running is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("Processor already running, start ignored");
            return;
        }

        info!(
            interval_secs = self.config.interval_secs,
            batch_size = self.config.batch_size,
            "Starting queue processor"
        );

        let (shutdown, mut stop) = watch::channel(false);
        let service = Arc::clone(&self.service);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            // Drain any backlog before settling into the interval
            run_pass(&service, &config).await;

            let mut timer = tokio::time::interval(Duration::from_secs(config.interval_secs));
            // Skip the first tick to avoid immediate execution
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        run_pass(&service, &config).await;
                    }
                    _ = stop.changed() => {
                        info!("Queue processor stopping");
                        break;
                    }
                }
            }
        });

        *running = Some(Running { shutdown, handle });
    }

    /// Stop the background loop, waiting for any in-flight pass to finish
    ///
    /// A call while stopped is a no-op.
    pub async fn stop(&self) {
        let Some(Running { shutdown, handle }) = self.running.lock().await.take() else {
            debug!("Processor not running, stop ignored");
            return;
        };

        // An in-flight pass completes; only future ticks are cancelled.
        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            error!(error = %e, "Processor task panicked");
        }
        info!("Queue processor stopped");
    }

    /// Run a single pass right now, without touching the timer loop
    ///
    /// Works whether or not the processor is started.
    pub async fn trigger(&self) {
        debug!("Manual processing pass triggered");
        run_pass(&self.service, &self.config).await;
    }

    pub async fn status(&self) -> ProcessorStatus {
        ProcessorStatus {
            is_running: self.running.lock().await.is_some(),
            interval_secs: self.config.interval_secs,
        }
    }
}

/// One processing pass: a claim-and-process batch, plus an occasional sweep
/// of old sent tasks
async fn run_pass(service: &QueueService, config: &ProcessorConfig) {
    match service.claim_and_process_batch(config.batch_size).await {
        Ok(outcome) if outcome.processed > 0 => {
            info!(
                processed = outcome.processed,
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                "Processing pass complete"
            );
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Error processing queue");
        }
    }

    if rand::rng().random_bool(config.cleanup_probability.clamp(0.0, 1.0)) {
        match service.cleanup_old_tasks(config.cleanup_days).await {
            Ok(0) => {}
            Ok(removed) => {
                info!(removed, days = config.cleanup_days, "Swept old sent tasks");
            }
            Err(e) => {
                error!(error = %e, "Error sweeping old sent tasks");
            }
        }
    }
}

//! Top-level configuration and wiring
//!
//! One TOML file describes the whole queue: which store backs it, the SMTP
//! server it delivers through, the templates it can render, and the queue
//! and processor tuning. [`Config::build`] turns that description into a
//! running-ready [`QueueService`] and [`Processor`] pair.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

use outbox_queue::{Processor, ProcessorConfig, QueueConfig, QueueService};
use outbox_store::{MemoryTaskStore, TaskStore};
use outbox_template::TemplateRegistry;
use outbox_transport::{SmtpConfig, SmtpTransport, Transport, TransportError};

#[derive(Error, Debug)]
pub enum BuildError {
    /// No `[smtp]` section and no transport supplied by the caller.
    #[error("No SMTP transport configured")]
    MissingTransport,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Which backend holds the task rows
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process map, lost on shutdown; suitable for tests and
    /// single-process deployments that can tolerate requeueing on restart
    Memory {
        /// Maximum number of rows held; unbounded when omitted
        #[serde(default)]
        capacity: Option<usize>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory { capacity: None }
    }
}

impl StoreConfig {
    fn build(&self) -> Arc<dyn TaskStore> {
        match self {
            Self::Memory { capacity: None } => Arc::new(MemoryTaskStore::new()),
            Self::Memory {
                capacity: Some(capacity),
            } => Arc::new(MemoryTaskStore::with_capacity(*capacity)),
        }
    }
}

/// The full queue configuration, usually read from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    /// SMTP delivery settings; omit to wire a transport in code instead
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    /// Templates keyed by id, renderable at send time
    #[serde(default)]
    pub templates: TemplateRegistry,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// If the configuration file doesn't exist, or is not readable,
    /// or if the configuration file is invalid.
    pub fn from_config(file: &str) -> std::io::Result<Self> {
        let file = Path::new(file);
        let mut reader = BufReader::new(File::open(file)?);
        let mut config = String::new();
        reader.read_to_string(&mut config)?;

        toml::from_str(&config)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()))
    }

    /// Build the service and its processor using the configured SMTP
    /// transport
    ///
    /// # Errors
    /// `MissingTransport` without an `[smtp]` section, or any transport
    /// construction failure.
    pub fn build(self) -> Result<(Arc<QueueService>, Processor), BuildError> {
        let smtp = self.smtp.as_ref().ok_or(BuildError::MissingTransport)?;
        let transport = Arc::new(SmtpTransport::new(smtp)?);
        Ok(self.build_with_transport(transport))
    }

    /// Build the service and its processor over any transport
    ///
    /// Lets tests and embedders swap in their own delivery mechanism while
    /// keeping the configured store, templates, and tuning.
    #[must_use]
    pub fn build_with_transport(
        self,
        transport: Arc<dyn Transport>,
    ) -> (Arc<QueueService>, Processor) {
        let service = Arc::new(QueueService::new(
            self.store.build(),
            transport,
            Arc::new(self.templates),
            self.queue,
        ));
        let processor = Processor::new(Arc::clone(&service), self.processor);
        (service, processor)
    }
}

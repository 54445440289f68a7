//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. It replays the operation log in batches with
//! actor-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (actor partitioning + tokio tasks)
//!     └── Shop<InMemoryLedgerStore> (row-locked shared state)
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so an actor's operations keep file order
//!   across batch boundaries
//! - Inside a batch the registrations run first, in file order
//! - Then each actor's remaining operations run as one tokio task
//! - Operations of different actors inside a batch may interleave in any
//!   order; the store's row locks keep every balance non-negative and every
//!   transfer atomic regardless

use crate::cli::ReportKind;
use crate::core::{log_rejection, BatchProcessor, LedgerConfig, Shop};
use crate::io::async_reader::AsyncReader;
use crate::store::InMemoryLedgerStore;
use crate::strategy::{write_report, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults with a warning
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger: Arc<LedgerConfig>,
    report: ReportKind,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - Batch size and worker count
    /// * `ledger` - Catalog and starting balance
    /// * `report` - Report written after the replay
    pub fn new(config: BatchConfig, ledger: Arc<LedgerConfig>, report: ReportKind) -> Self {
        Self {
            config,
            ledger,
            report,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay the log batch by batch and write the report
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned
    /// immediately. Rejected operations are logged and the replay continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let shop = Shop::new(
                Arc::new(InMemoryLedgerStore::new()),
                Arc::clone(&self.ledger),
            );
            let processor = BatchProcessor::new(shop.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads futures::io, tokio files implement tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut replayed = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Wait for the whole batch so an actor's later operations
                // never overtake earlier ones
                for outcome in processor.process_batch(batch).await {
                    replayed += 1;
                    if let Err(e) = &outcome.result {
                        rejected += 1;
                        log_rejection(&outcome.operation, e);
                    }
                }
            }
            info!(replayed, rejected, "replay finished");

            write_report(&shop, self.report, output).await
        })
    }
}

//! Asynchronous batch processing strategy
//!
//! Replays a command script batch by batch. Within a batch, commands are
//! partitioned by user and the partitions run concurrently on a tokio
//! runtime, putting the marketplace's per-entity locks under real contention.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── LedgerConfig (vault key)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning + blocking tasks)
//!         └── Marketplace (shared, entity-locked)
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so a user's commands keep file order
//!   across the whole script
//! - Commands of different users in the same batch may interleave freely

use crate::io::async_reader::AsyncReader;
use crate::strategy::{finish, log_outcome, BatchProcessor, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Maximum number of user partitions executing at once
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
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
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
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay the script batch by batch
    ///
    /// 1. Builds the marketplace and a tokio runtime sized by the config
    /// 2. Reads commands in batches with `AsyncReader`
    /// 3. Executes each batch through `BatchProcessor`, waiting for it to finish
    /// 4. Writes the final wallets
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let market = Arc::new(self.ledger.build_marketplace()?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(Arc::clone(&market));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut executed = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in processor.process_batch(batch).await {
                    log_outcome(&outcome.record, &outcome.result);
                    executed += 1;
                }
            }

            info!(commands = executed, "replay finished");
            Ok::<(), String>(())
        })?;

        finish(&market, output)
    }
}

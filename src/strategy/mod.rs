//! Processing strategy module for command script replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering CSV parsing, command execution against a fresh marketplace, and
//! wallet output. Implementations (sequential, concurrent batch) are selected
//! at runtime.

use crate::cli::StrategyType;
use crate::commands::{CommandRecord, Reply};
use crate::core::{KeyVault, Marketplace};
use crate::io::csv_format::write_wallets_csv;
use crate::store::InMemoryStore;
use crate::types::MarketError;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod r#async;
pub mod batch_processor;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads commands from a CSV script, runs them against its own
/// marketplace, and writes the final wallets to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` and write wallets to `output`
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the CSV command script
    /// * `output` - Writer receiving the wallet CSV
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed, including when individual commands failed
    /// * `Err(String)` on a fatal error (unreadable input, bad vault key, output failure)
    ///
    /// Rejected commands are logged and replay continues with the next one.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Marketplace settings shared by every strategy
#[derive(Clone, Default)]
pub struct LedgerConfig {
    /// Base64 32-byte vault key; a fresh key is generated when absent
    pub encryption_key: Option<String>,
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LedgerConfig {
    /// Open a fresh in-memory marketplace with the configured vault key
    pub fn build_marketplace(&self) -> Result<Marketplace<InMemoryStore>, String> {
        let vault = KeyVault::from_config(self.encryption_key.as_deref())
            .map_err(|e| format!("Failed to configure key vault: {}", e))?;
        Ok(Marketplace::new(Arc::new(InMemoryStore::open()), vault))
    }
}

/// Log the outcome of one replayed command
pub(crate) fn log_outcome(record: &CommandRecord, result: &Result<Reply, MarketError>) {
    match result {
        Ok(reply) => debug!(
            user = record.user,
            command = record.command.name(),
            %reply,
            "command completed"
        ),
        Err(e) => warn!(
            user = record.user,
            command = record.command.name(),
            error = %e,
            "command rejected"
        ),
    }
}

/// Write the final wallets and close the store
pub(crate) fn finish(
    market: &Marketplace<InMemoryStore>,
    output: &mut dyn Write,
) -> Result<(), String> {
    let wallets = market
        .wallets()
        .map_err(|e| format!("Failed to read wallets: {}", e))?;
    write_wallets_csv(&wallets, output)?;
    market.store().close();
    Ok(())
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
/// * `ledger` - Marketplace settings
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    ledger: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, ledger))
        }
    }
}

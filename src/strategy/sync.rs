//! Synchronous processing strategy
//!
//! Replays a command script one row at a time, in file order, on the calling
//! thread. This is the faithful replay of a chat session: a command always
//! observes the effects of every command before it.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command execution to `commands::execute`
//! - CSV output to `csv_format::write_wallets_csv`

use crate::commands::execute;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{finish, log_outcome, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use chat_market_ledger::strategy::{LedgerConfig, ProcessingStrategy, SyncProcessingStrategy};
/// use std::io;
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
/// strategy
///     .process(Path::new("commands.csv"), &mut io::stdout())
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    ledger: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(ledger: LedgerConfig) -> Self {
        Self { ledger }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let market = self.ledger.build_marketplace()?;
        let reader = SyncReader::new(input_path)?;

        let mut executed = 0usize;
        for result in reader {
            match result {
                Ok(record) => {
                    let outcome = execute(&market, &record);
                    log_outcome(&record, &outcome);
                    executed += 1;
                }
                Err(e) => warn!(error = %e, "skipping command row"),
            }
        }

        info!(commands = executed, "replay finished");
        finish(&market, output)
    }
}

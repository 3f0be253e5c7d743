use crate::strategy::{BatchConfig, LedgerConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay marketplace bot commands against a wallet ledger
#[derive(Parser, Debug)]
#[command(name = "chat-market-ledger")]
#[command(about = "Replay marketplace bot commands and print the resulting wallets", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing command records
    #[arg(value_name = "INPUT", help = "Path to the input CSV script (command,user,args)")]
    pub input_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' for file order or 'async' for concurrent per-user batches"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent user partitions (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of user partitions running concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Key sealing wallet key material
    #[arg(
        long = "encryption-key",
        value_name = "BASE64",
        env = "MARKET_ENCRYPTION_KEY",
        hide_env_values = true,
        help = "Base64-encoded 32-byte vault key (default: generated per run)"
    )]
    pub encryption_key: Option<String>,
}

/// Available replay strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values take their defaults; zero values fall back to the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            encryption_key: self.encryption_key.clone(),
        }
    }
}

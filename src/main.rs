//! Chat Market Ledger CLI
//!
//! Replays a CSV script of marketplace bot commands and prints the final wallets.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > wallets.csv
//! cargo run -- --strategy async --batch-size 500 --max-concurrent 8 commands.csv > wallets.csv
//! MARKET_ENCRYPTION_KEY=$(openssl rand -base64 32) cargo run -- commands.csv
//! ```
//!
//! # Processing Strategies
//!
//! - **sync**: Commands run one at a time in file order (default)
//! - **async**: Batches partitioned by user, partitions run concurrently
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, invalid vault key, etc.)

use chat_market_ledger::cli;
use chat_market_ledger::logging;
use chat_market_ledger::strategy;
use std::process;
use tracing::error;

fn main() {
    logging::init_logging();
    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, args.to_ledger_config())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        process::exit(1);
    }
}

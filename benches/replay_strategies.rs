//! Benchmark suite for comparing replay strategies
//!
//! This benchmark compares the performance of the synchronous and asynchronous
//! replay strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Benchmark Scripts
//!
//! Scripts are generated into temporary files before timing starts:
//! - small: 10 users (about 100 commands)
//! - medium: 100 users (about 1,000 commands)
//! - large: 1,000 users (about 10,000 commands)
//!
//! Each script includes a mix of:
//! - Registrations and deposits
//! - Listings and purchases across users
//! - Transfers, withdrawals and read-only commands

use chat_market_ledger::cli::StrategyType;
use chat_market_ledger::strategy::{create_strategy, BatchConfig, LedgerConfig};
use divan::Bencher;
use std::fmt::Write as _;
use std::io::Write;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

/// Write a trading script for `users` users
fn script(users: u64) -> NamedTempFile {
    let mut script = String::from("command,user,args\n");
    for user in 1..=users {
        writeln!(script, "start,{},trader{}", user, user).unwrap();
        writeln!(script, "deposit,{},1000", user).unwrap();
        writeln!(script, "sell,{},Crate {}|Supply crate number {}|25", user, user, user).unwrap();
    }
    for user in 1..=users {
        let peer = user % users + 1;
        writeln!(script, "buy,{},{}", user, peer).unwrap();
        writeln!(script, "transfer,{},{} 10", user, peer).unwrap();
        writeln!(script, "withdraw,{},0x{:040x} 5", user, user).unwrap();
        writeln!(script, "balance,{}", user).unwrap();
        writeln!(script, "market,{}", user).unwrap();
        writeln!(script, "history,{}", user).unwrap();
        writeln!(script, "relist,{},{} 30", user, user).unwrap();
    }

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(script.as_bytes())
        .expect("Failed to write script");
    file.flush().expect("Failed to flush script");
    file
}

fn run(bencher: Bencher, strategy_type: StrategyType, users: u64) {
    let file = script(users);
    bencher.bench_local(|| {
        let config = match strategy_type {
            StrategyType::Sync => None,
            StrategyType::Async => Some(BatchConfig::default()),
        };
        let strategy = create_strategy(strategy_type.clone(), config, LedgerConfig::default());
        let mut output = Vec::new();

        strategy
            .process(file.path(), &mut output)
            .expect("Processing failed");
    });
}

/// Benchmark synchronous replay with the small script
#[divan::bench]
fn sync_strategy_small(bencher: Bencher) {
    run(bencher, StrategyType::Sync, 10);
}

/// Benchmark asynchronous replay with the small script
#[divan::bench]
fn async_strategy_small(bencher: Bencher) {
    run(bencher, StrategyType::Async, 10);
}

/// Benchmark synchronous replay with the medium script
#[divan::bench]
fn sync_strategy_medium(bencher: Bencher) {
    run(bencher, StrategyType::Sync, 100);
}

/// Benchmark asynchronous replay with the medium script
#[divan::bench]
fn async_strategy_medium(bencher: Bencher) {
    run(bencher, StrategyType::Async, 100);
}

/// Benchmark synchronous replay with the large script
#[divan::bench(sample_count = 10)]
fn sync_strategy_large(bencher: Bencher) {
    run(bencher, StrategyType::Sync, 1000);
}

/// Benchmark asynchronous replay with the large script
#[divan::bench(sample_count = 10)]
fn async_strategy_large(bencher: Bencher) {
    run(bencher, StrategyType::Async, 1000);
}

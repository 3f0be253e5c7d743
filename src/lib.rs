//! Chat Market Ledger Library
//! # Overview
//!
//! Wallet ledger and item exchange behind a chat-bot marketplace, with a
//! CSV command replay front end offering a sequential and a concurrent strategy.
//!
//! # Architecture
//!
//! - [`types`] - Users, wallets, items, ledger records and errors
//! - [`store`] - Record store contract with atomic write batches, and the in-memory store
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Wallet creation, balances, deposits, withdrawals, transfers
//!   - [`core::exchange`] - Listings, purchases, cancel and relist
//!   - [`core::locks`] - Per-entity locks shared by ledger and exchange
//!   - [`core::vault`] - Key material, addresses and key encryption
//! - [`commands`] - Bot command parsing and execution
//! - [`io`] - CSV scripts in, wallet CSV out
//! - [`strategy`] - Replay strategies
//! - [`cli`] - CLI arguments parsing
//!
//! # Money Rules
//!
//! - Balances are fixed-precision decimals and never go negative
//! - Every balance change writes exactly one ledger record in the same commit
//! - A purchase moves the price from buyer to seller and marks the item sold
//!   as one unit; a failure leaves nothing behind

pub mod cli;
pub mod commands;
pub mod core;
pub mod io;
pub mod logging;
pub mod store;
pub mod strategy;
pub mod types;

pub use core::{Exchange, KeyVault, Marketplace, WalletLedger};
pub use io::write_wallets_csv;
pub use store::{InMemoryStore, RecordStore, WriteBatch};
pub use types::{
    Item, ItemId, LedgerTransaction, MarketError, TransactionId, TransactionKind, UserId,
    ValidationReason, Wallet,
};

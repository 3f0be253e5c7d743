//! Core business logic module
//!
//! This module contains the ledger and exchange components:
//! - `locks` - Per-entity lock table shared by ledger and exchange
//! - `vault` - Key material, address derivation and key encryption
//! - `chain` - Optional withdrawal gateway
//! - `ledger` - Wallet balances and balance-changing operations
//! - `exchange` - Item listings and trade settlement
//! - `marketplace` - Facade adding user registration

pub mod chain;
pub mod exchange;
pub mod ledger;
pub mod locks;
pub mod marketplace;
pub mod vault;

pub use chain::{ChainGateway, SimulatedChain};
pub use exchange::{Exchange, Purchase};
pub use ledger::{Receipt, WalletLedger};
pub use locks::{EntityLocks, LockKey, LockSet};
pub use marketplace::Marketplace;
pub use vault::KeyVault;

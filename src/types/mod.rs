//! Types module
//!
//! Contains the four persisted entities and the error type:
//! - `user`: registered users
//! - `wallet`: per-user balance and key material
//! - `item`: marketplace listings and their lifecycle
//! - `transaction`: append-only ledger records
//! - `error`: error types for ledger and exchange operations

pub mod error;
pub mod item;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use error::{MarketError, ValidationReason};
pub use item::{Item, ItemId, ItemState, NewItem, MIN_DESCRIPTION_LEN, MIN_NAME_LEN};
pub use transaction::{
    LedgerTransaction, NewTransaction, TransactionId, TransactionKind, TransactionStatus,
    EXTERNAL_ACCOUNT,
};
pub use user::{User, UserId};
pub use wallet::{Wallet, AMOUNT_SCALE};

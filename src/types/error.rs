//! Error types for the marketplace ledger
//!
//! Every core operation returns either its success value or exactly one
//! [`MarketError`]. Business outcomes (insufficient funds, wrong owner, item
//! gone) are ordinary variants; only [`MarketError::Storage`] reports an
//! unexpected failure of the record store.
//!
//! # Error Categories
//!
//! - **Validation**: malformed listing or amount, see [`ValidationReason`]
//! - **Funds**: insufficient balance, arithmetic overflow
//! - **Listing**: item missing, not for sale, not listed, already listed
//! - **Ownership**: wrong owner, self trade
//! - **Registration**: unknown, duplicate or reserved user, missing wallet
//! - **Infrastructure**: storage and key encryption failures

use super::item::{ItemId, MIN_DESCRIPTION_LEN, MIN_NAME_LEN};
use super::user::UserId;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Specific rule a rejected input violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Listing price is zero or negative
    PriceNonPositive,
    /// Item name is shorter than [`MIN_NAME_LEN`] characters
    NameTooShort,
    /// Item description is shorter than [`MIN_DESCRIPTION_LEN`] characters
    DescriptionTooShort,
    /// Deposit, withdrawal or transfer amount is zero or negative
    AmountNonPositive,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::PriceNonPositive => f.write_str("price must be greater than zero"),
            ValidationReason::NameTooShort => {
                write!(f, "name must contain at least {} characters", MIN_NAME_LEN)
            }
            ValidationReason::DescriptionTooShort => write!(
                f,
                "description must contain at least {} characters",
                MIN_DESCRIPTION_LEN
            ),
            ValidationReason::AmountNonPositive => f.write_str("amount must be greater than zero"),
        }
    }
}

/// Main error type for ledger and exchange operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    /// Input rejected before any state was touched
    #[error("Validation failed: {reason}")]
    Validation {
        /// The rule that was violated
        reason: ValidationReason,
    },

    /// Balance too low for the requested debit
    ///
    /// The operation is rejected and no balance changes.
    #[error("Insufficient funds for user {user}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        user: UserId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("Item {item} not found")]
    ItemNotFound { item: ItemId },

    /// Purchase attempted on an item that is sold or delisted
    #[error("Item {item} is not for sale")]
    ItemNotForSale { item: ItemId },

    /// Cancel attempted on an item that is already off sale
    #[error("Item {item} is not listed")]
    NotListed { item: ItemId },

    /// Relist attempted on an item that is still for sale
    #[error("Item {item} is already listed")]
    AlreadyListed { item: ItemId },

    /// Listing change attempted by someone other than the seller
    #[error("User {user} does not own item {item}")]
    NotOwner { item: ItemId, user: UserId },

    /// Seller tried to buy their own item
    #[error("User {user} cannot buy their own item {item}")]
    SelfTrade { item: ItemId, user: UserId },

    /// Balance change targeted a user without a wallet
    #[error("No wallet for user {user}")]
    WalletNotFound { user: UserId },

    #[error("User {user} is already registered")]
    UserAlreadyRegistered { user: UserId },

    #[error("User {user} is not registered")]
    UserNotRegistered { user: UserId },

    /// Registration attempted with the id standing for the outside world
    #[error("User id {user} is reserved for the external account")]
    ReservedUser { user: UserId },

    /// Checked decimal arithmetic would overflow
    ///
    /// The operation is rejected to keep the balance intact.
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow { operation: String, user: UserId },

    /// Key material could not be encrypted or decrypted
    #[error("Key vault error: {message}")]
    Crypto { message: String },

    /// The record store failed
    ///
    /// This is the only unexpected failure. Any multi-step operation that
    /// reports it has left no partial writes behind.
    #[error("Storage error: {cause}")]
    Storage { cause: String },
}

impl From<ValidationReason> for MarketError {
    fn from(reason: ValidationReason) -> Self {
        MarketError::Validation { reason }
    }
}

// Helper functions for creating common errors

impl MarketError {
    pub fn insufficient_funds(user: UserId, balance: Decimal, requested: Decimal) -> Self {
        MarketError::InsufficientFunds {
            user,
            balance,
            requested,
        }
    }

    pub fn item_not_found(item: ItemId) -> Self {
        MarketError::ItemNotFound { item }
    }

    pub fn not_owner(item: ItemId, user: UserId) -> Self {
        MarketError::NotOwner { item, user }
    }

    pub fn wallet_not_found(user: UserId) -> Self {
        MarketError::WalletNotFound { user }
    }

    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        MarketError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }

    pub fn crypto(message: impl fmt::Display) -> Self {
        MarketError::Crypto {
            message: message.to_string(),
        }
    }

    pub fn storage(cause: impl fmt::Display) -> Self {
        MarketError::Storage {
            cause: cause.to_string(),
        }
    }

    /// Whether this is an infrastructure failure rather than a business outcome
    pub fn is_storage(&self) -> bool {
        matches!(self, MarketError::Storage { .. })
    }
}

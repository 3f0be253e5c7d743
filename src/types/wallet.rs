//! Wallet state
//!
//! Each registered user owns exactly one wallet, created at registration and
//! never deleted. The balance held here is the source of truth for the
//! marketplace.

use super::user::UserId;
use rust_decimal::Decimal;

/// Decimal places accepted in command amounts and printed in wallet output
pub const AMOUNT_SCALE: u32 = 4;

/// A user's simulated crypto wallet
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    /// Owning user
    pub user: UserId,

    /// Public deposit address (`0x` followed by 40 hex characters)
    pub address: String,

    /// Key material, encrypted with the process-wide vault key
    ///
    /// The plaintext key is never stored.
    pub encrypted_key: String,

    /// Current balance, never negative
    pub balance: Decimal,
}

impl Wallet {
    /// Create a wallet with a zero balance
    pub fn new(user: UserId, address: String, encrypted_key: String) -> Self {
        Wallet {
            user,
            address,
            encrypted_key,
            balance: Decimal::ZERO,
        }
    }
}

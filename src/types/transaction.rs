//! Ledger transaction types
//!
//! Every balance-affecting event is recorded exactly once as a
//! [`LedgerTransaction`]. Records are appended by the store and never mutated
//! or deleted afterwards.

use super::item::ItemId;
use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger transaction identifier, assigned by the store in commit order
pub type TransactionId = u64;

/// Reserved user id standing for the world outside the marketplace
///
/// Deposits are sent by it and withdrawals are received by it. It never owns
/// a wallet.
pub const EXTERNAL_ACCOUNT: UserId = 0;

/// Kind of balance-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Funds entering from outside (sender is [`EXTERNAL_ACCOUNT`])
    Deposit,

    /// Funds leaving to an external address (receiver is [`EXTERNAL_ACCOUNT`])
    Withdrawal,

    /// Direct user-to-user payment
    Transfer,

    /// Payment settling an item trade
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement status of a recorded transaction
///
/// Settlement is synchronous, so every record is written in its terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Completed => f.write_str("completed"),
        }
    }
}

/// A transaction about to be appended to the ledger
///
/// The store assigns the id and timestamp when the record is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub sender: UserId,
    pub receiver: UserId,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// External reference hash (simulated chain hash or caller supplied)
    pub reference: Option<String>,
    /// Item traded, for purchases
    pub item: Option<ItemId>,
}

impl NewTransaction {
    fn new(sender: UserId, receiver: UserId, amount: Decimal, kind: TransactionKind) -> Self {
        Self {
            sender,
            receiver,
            amount,
            kind,
            status: TransactionStatus::Completed,
            reference: None,
            item: None,
        }
    }

    pub fn deposit(user: UserId, amount: Decimal) -> Self {
        Self::new(EXTERNAL_ACCOUNT, user, amount, TransactionKind::Deposit)
    }

    pub fn withdrawal(user: UserId, amount: Decimal) -> Self {
        Self::new(user, EXTERNAL_ACCOUNT, amount, TransactionKind::Withdrawal)
    }

    pub fn transfer(from: UserId, to: UserId, amount: Decimal) -> Self {
        Self::new(from, to, amount, TransactionKind::Transfer)
    }

    pub fn purchase(buyer: UserId, seller: UserId, amount: Decimal, item: ItemId) -> Self {
        let mut tx = Self::new(buyer, seller, amount, TransactionKind::Purchase);
        tx.item = Some(item);
        tx
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// A committed, immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub sender: UserId,
    pub receiver: UserId,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub item: Option<ItemId>,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub reference: Option<String>,
}

impl LedgerTransaction {
    /// Stamp a pending transaction with its id and commit time
    pub fn committed(id: TransactionId, tx: NewTransaction, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: tx.sender,
            receiver: tx.receiver,
            amount: tx.amount,
            kind: tx.kind,
            item: tx.item,
            timestamp,
            status: tx.status,
            reference: tx.reference,
        }
    }

    /// Whether `user` is on either side of this transaction
    pub fn involves(&self, user: UserId) -> bool {
        self.sender == user || self.receiver == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_comes_from_external_account() {
        let tx = NewTransaction::deposit(7, Decimal::new(10, 0));
        assert_eq!(tx.sender, EXTERNAL_ACCOUNT);
        assert_eq!(tx.receiver, 7);
        assert_eq!(tx.kind, TransactionKind::Deposit);
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_withdrawal_goes_to_external_account() {
        let tx = NewTransaction::withdrawal(7, Decimal::new(10, 0))
            .with_reference(Some("0xabc".to_string()));
        assert_eq!(tx.sender, 7);
        assert_eq!(tx.receiver, EXTERNAL_ACCOUNT);
        assert_eq!(tx.reference.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_purchase_carries_item() {
        let tx = NewTransaction::purchase(2, 1, Decimal::new(100, 0), 9);
        assert_eq!(tx.item, Some(9));
        assert_eq!(tx.kind.to_string(), "purchase");
    }

    #[test]
    fn test_involves_matches_either_side() {
        let tx = LedgerTransaction::committed(
            1,
            NewTransaction::transfer(3, 4, Decimal::ONE),
            Utc::now(),
        );
        assert!(tx.involves(3));
        assert!(tx.involves(4));
        assert!(!tx.involves(5));
    }
}

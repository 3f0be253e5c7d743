//! Record store contract
//!
//! The ledger and exchange read and write the four persisted entities (user,
//! wallet, item, transaction) only through [`RecordStore`]. Every mutation of
//! balances, items or the transaction log is expressed as a [`WriteBatch`]
//! and handed to [`RecordStore::commit`], which applies it all-or-nothing.
//!
//! - `memory` - In-memory implementation backed by `DashMap`

pub mod memory;

pub use memory::InMemoryStore;

use crate::types::{
    Item, ItemId, LedgerTransaction, MarketError, NewItem, NewTransaction, TransactionId, User,
    UserId, Wallet,
};
use rust_decimal::Decimal;

/// A single write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace a wallet's balance
    SetBalance { user: UserId, balance: Decimal },

    /// Replace an existing item row
    SaveItem(Item),

    /// Append a record to the transaction log
    AppendTransaction(NewTransaction),
}

/// An ordered set of writes applied as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&mut self, user: UserId, balance: Decimal) -> &mut Self {
        self.mutations.push(Mutation::SetBalance { user, balance });
        self
    }

    pub fn save_item(&mut self, item: Item) -> &mut Self {
        self.mutations.push(Mutation::SaveItem(item));
        self
    }

    pub fn append(&mut self, transaction: NewTransaction) -> &mut Self {
        self.mutations
            .push(Mutation::AppendTransaction(transaction));
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

/// Durable keyed storage for users, wallets, items and transactions
///
/// All methods report infrastructure failures as [`MarketError::Storage`].
/// Creation methods return `false` when the row could not be created (for
/// example because it already exists, or the id is
/// [`EXTERNAL_ACCOUNT`](crate::types::EXTERNAL_ACCOUNT)) rather than failing.
pub trait RecordStore: Send + Sync {
    /// Check whether a user is registered
    fn user_exists(&self, id: UserId) -> Result<bool, MarketError>;

    /// Register a user, stamping joined and last-active times
    fn create_user(&self, id: UserId, username: &str) -> Result<bool, MarketError>;

    fn get_user(&self, id: UserId) -> Result<Option<User>, MarketError>;

    /// Refresh a user's last-active time
    fn touch_user(&self, id: UserId) -> Result<bool, MarketError>;

    /// Create the wallet of a registered user with a zero balance
    fn create_wallet(
        &self,
        user: UserId,
        address: &str,
        encrypted_key: &str,
    ) -> Result<bool, MarketError>;

    /// Register a user together with their zero-balance wallet
    ///
    /// Both rows are created or neither is; `false` if the user already exists.
    fn create_account(
        &self,
        id: UserId,
        username: &str,
        address: &str,
        encrypted_key: &str,
    ) -> Result<bool, MarketError>;

    fn get_wallet(&self, user: UserId) -> Result<Option<Wallet>, MarketError>;

    /// All wallets, ordered by user id
    fn all_wallets(&self) -> Result<Vec<Wallet>, MarketError>;

    /// Insert a listing in the for-sale state and return its id
    fn create_item(&self, item: NewItem) -> Result<ItemId, MarketError>;

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, MarketError>;

    /// Items currently for sale, ordered by id
    fn available_items(&self) -> Result<Vec<Item>, MarketError>;

    /// Items the user sold or bought, ordered by id
    fn user_items(&self, user: UserId) -> Result<Vec<Item>, MarketError>;

    /// Ledger records where the user is sender or receiver, in commit order
    fn transactions_for(&self, user: UserId) -> Result<Vec<LedgerTransaction>, MarketError>;

    /// Apply every mutation of `batch` or none of them
    ///
    /// Returns the ids assigned to appended transactions, in batch order.
    fn commit(&self, batch: WriteBatch) -> Result<Vec<TransactionId>, MarketError>;

    /// Replace a wallet balance; `false` if the user has no wallet
    fn update_balance(&self, user: UserId, balance: Decimal) -> Result<bool, MarketError> {
        if self.get_wallet(user)?.is_none() {
            return Ok(false);
        }
        let mut batch = WriteBatch::new();
        batch.set_balance(user, balance);
        self.commit(batch)?;
        Ok(true)
    }

    /// Append a single ledger record and return its id
    fn record_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<TransactionId, MarketError> {
        let mut batch = WriteBatch::new();
        batch.append(transaction);
        self.commit(batch)?
            .first()
            .copied()
            .ok_or_else(|| MarketError::storage("transaction log returned no id"))
    }
}

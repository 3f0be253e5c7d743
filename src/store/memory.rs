//! In-memory record store
//!
//! `InMemoryStore` keeps users, wallets and items in `DashMap` tables and the
//! transaction log in an append-only vector.
//!
//! # Atomicity
//!
//! [`RecordStore::commit`] holds the commit mutex for the whole batch. It
//! first validates every mutation against the current tables (wallet and item
//! rows must exist, balances must stay non-negative, amounts must be
//! positive) and only then applies them, so a rejected batch leaves no trace.
//!
//! # Lifecycle
//!
//! The store is opened explicitly with [`InMemoryStore::open`] and shut with
//! [`InMemoryStore::close`]. Every call on a closed store fails with
//! [`MarketError::Storage`].

use super::{Mutation, RecordStore, WriteBatch};
use crate::types::{
    Item, ItemId, LedgerTransaction, MarketError, NewItem, TransactionId, User, UserId, Wallet,
    EXTERNAL_ACCOUNT,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, info};

/// Thread-safe in-memory implementation of [`RecordStore`]
#[derive(Debug)]
pub struct InMemoryStore {
    users: DashMap<UserId, User>,
    wallets: DashMap<UserId, Wallet>,
    items: DashMap<ItemId, Item>,

    /// Append-only ledger; a record's id is its position plus one
    transactions: RwLock<Vec<LedgerTransaction>>,

    next_item_id: AtomicU64,

    /// Serializes batch commits against each other
    commit_lock: Mutex<()>,

    open: AtomicBool,

    /// Fault injection for atomicity tests
    fail_commits: AtomicBool,
}

impl InMemoryStore {
    /// Open an empty store
    pub fn open() -> Self {
        info!("record store opened");
        Self {
            users: DashMap::new(),
            wallets: DashMap::new(),
            items: DashMap::new(),
            transactions: RwLock::new(Vec::new()),
            next_item_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
            open: AtomicBool::new(true),
            fail_commits: AtomicBool::new(false),
        }
    }

    /// Close the store; later calls fail with a storage error
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("record store closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Number of records in the transaction log
    pub fn transaction_count(&self) -> usize {
        self.transactions.read().len()
    }

    /// Make every following commit and account creation fail with a storage error
    #[cfg(test)]
    pub(crate) fn inject_commit_failure(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), MarketError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(MarketError::storage("record store is closed"))
        }
    }

    /// Check a batch against the current tables without changing anything
    fn validate(&self, batch: &WriteBatch) -> Result<(), MarketError> {
        for mutation in batch.mutations() {
            match mutation {
                Mutation::SetBalance { user, balance } => {
                    if !self.wallets.contains_key(user) {
                        return Err(MarketError::storage(format!(
                            "no wallet row for user {}",
                            user
                        )));
                    }
                    if *balance < Decimal::ZERO {
                        return Err(MarketError::storage(format!(
                            "negative balance {} rejected for user {}",
                            balance, user
                        )));
                    }
                }
                Mutation::SaveItem(item) => {
                    if !self.items.contains_key(&item.id) {
                        return Err(MarketError::storage(format!(
                            "no item row with id {}",
                            item.id
                        )));
                    }
                }
                Mutation::AppendTransaction(tx) => {
                    if tx.amount <= Decimal::ZERO {
                        return Err(MarketError::storage(format!(
                            "non-positive {} amount {} rejected",
                            tx.kind, tx.amount
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn sorted_items<F>(&self, filter: F) -> Vec<Item>
    where
        F: Fn(&Item) -> bool,
    {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::open()
    }
}

impl RecordStore for InMemoryStore {
    fn user_exists(&self, id: UserId) -> Result<bool, MarketError> {
        self.ensure_open()?;
        Ok(self.users.contains_key(&id))
    }

    fn create_user(&self, id: UserId, username: &str) -> Result<bool, MarketError> {
        self.ensure_open()?;
        if id == EXTERNAL_ACCOUNT {
            return Ok(false);
        }
        let mut created = false;
        self.users.entry(id).or_insert_with(|| {
            created = true;
            User::new(id, username, Utc::now())
        });
        Ok(created)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, MarketError> {
        self.ensure_open()?;
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    fn touch_user(&self, id: UserId) -> Result<bool, MarketError> {
        self.ensure_open()?;
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.last_active = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn create_wallet(
        &self,
        user: UserId,
        address: &str,
        encrypted_key: &str,
    ) -> Result<bool, MarketError> {
        self.ensure_open()?;
        if user == EXTERNAL_ACCOUNT || !self.users.contains_key(&user) {
            return Ok(false);
        }
        let mut created = false;
        self.wallets.entry(user).or_insert_with(|| {
            created = true;
            Wallet::new(user, address.to_string(), encrypted_key.to_string())
        });
        Ok(created)
    }

    fn create_account(
        &self,
        id: UserId,
        username: &str,
        address: &str,
        encrypted_key: &str,
    ) -> Result<bool, MarketError> {
        self.ensure_open()?;
        if id == EXTERNAL_ACCOUNT {
            return Ok(false);
        }
        let _commit = self.commit_lock.lock();
        if self.fail_commits.load(Ordering::SeqCst) {
            error!(user = id, "account creation failed: injected fault");
            return Err(MarketError::storage("injected commit failure"));
        }

        // The wallet goes in while the user's shard is held, so no reader
        // sees the user without a wallet
        let mut created = false;
        self.users.entry(id).or_insert_with(|| {
            created = true;
            self.wallets.insert(
                id,
                Wallet::new(id, address.to_string(), encrypted_key.to_string()),
            );
            User::new(id, username, Utc::now())
        });
        Ok(created)
    }

    fn get_wallet(&self, user: UserId) -> Result<Option<Wallet>, MarketError> {
        self.ensure_open()?;
        Ok(self.wallets.get(&user).map(|wallet| wallet.clone()))
    }

    fn all_wallets(&self) -> Result<Vec<Wallet>, MarketError> {
        self.ensure_open()?;
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        wallets.sort_by_key(|wallet| wallet.user);
        Ok(wallets)
    }

    fn create_item(&self, item: NewItem) -> Result<ItemId, MarketError> {
        self.ensure_open()?;
        let id = self.next_item_id.fetch_add(1, Ordering::SeqCst);
        self.items.insert(id, item.into_item(id, Utc::now()));
        Ok(id)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Item>, MarketError> {
        self.ensure_open()?;
        Ok(self.items.get(&id).map(|item| item.clone()))
    }

    fn available_items(&self) -> Result<Vec<Item>, MarketError> {
        self.ensure_open()?;
        Ok(self.sorted_items(|item| item.for_sale))
    }

    fn user_items(&self, user: UserId) -> Result<Vec<Item>, MarketError> {
        self.ensure_open()?;
        Ok(self.sorted_items(|item| item.belongs_to(user)))
    }

    fn transactions_for(&self, user: UserId) -> Result<Vec<LedgerTransaction>, MarketError> {
        self.ensure_open()?;
        Ok(self
            .transactions
            .read()
            .iter()
            .filter(|tx| tx.involves(user))
            .cloned()
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<TransactionId>, MarketError> {
        self.ensure_open()?;
        let _commit = self.commit_lock.lock();

        if self.fail_commits.load(Ordering::SeqCst) {
            error!(mutations = batch.len(), "commit failed: injected fault");
            return Err(MarketError::storage("injected commit failure"));
        }
        if let Err(e) = self.validate(&batch) {
            error!(error = %e, "commit rejected");
            return Err(e);
        }

        let now = Utc::now();
        let mut log = self.transactions.write();
        let mut ids = Vec::new();

        for mutation in batch.into_mutations() {
            match mutation {
                Mutation::SetBalance { user, balance } => {
                    if let Some(mut wallet) = self.wallets.get_mut(&user) {
                        wallet.balance = balance;
                    }
                }
                Mutation::SaveItem(item) => {
                    self.items.insert(item.id, item);
                }
                Mutation::AppendTransaction(tx) => {
                    let id = log.len() as TransactionId + 1;
                    log.push(LedgerTransaction::committed(id, tx, now));
                    ids.push(id);
                }
            }
        }

        debug!(transactions = ids.len(), "batch committed");
        Ok(ids)
    }
}

//! Wallet ledger
//!
//! This module provides the `WalletLedger`, which owns every wallet balance
//! and produces an audit record for each balance mutation.
//!
//! The WalletLedger is responsible for:
//! - Creating wallets (key material, address, sealed key) at registration
//! - Answering balance queries
//! - Deposits, withdrawals and user-to-user transfers
//! - Staging payments for the exchange's trade settlement
//!
//! # Atomicity
//!
//! Each operation locks the wallets it touches, re-reads them under the
//! lock, computes the new balances with checked arithmetic and commits the
//! balance changes together with the ledger record as one [`WriteBatch`].
//! Any rejection happens before the commit, so a failed operation leaves the
//! state exactly as it found it.

use crate::core::chain::{ChainGateway, SimulatedChain};
use crate::core::locks::{EntityLocks, LockKey};
use crate::core::vault::{self, KeyVault};
use crate::store::{RecordStore, WriteBatch};
use crate::types::{
    LedgerTransaction, MarketError, NewTransaction, TransactionId, UserId, ValidationReason,
    Wallet,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a settled balance operation
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Id of the ledger record written
    pub transaction: TransactionId,

    /// Balance of the acting user after the operation
    pub balance: Decimal,

    /// Reference hash attached to the record, if any
    pub reference: Option<String>,
}

/// Reject zero and negative amounts
pub(crate) fn validate_amount(amount: Decimal) -> Result<(), MarketError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationReason::AmountNonPositive.into());
    }
    Ok(())
}

/// Balance of `wallet` after receiving `amount`
fn credited(wallet: &Wallet, amount: Decimal, operation: &str) -> Result<Decimal, MarketError> {
    wallet
        .balance
        .checked_add(amount)
        .ok_or_else(|| MarketError::arithmetic_overflow(operation, wallet.user))
}

/// Balance of `wallet` after paying `amount`
///
/// Fails with `InsufficientFunds` rather than going negative.
fn debited(wallet: &Wallet, amount: Decimal) -> Result<Decimal, MarketError> {
    if wallet.balance < amount {
        return Err(MarketError::insufficient_funds(
            wallet.user,
            wallet.balance,
            amount,
        ));
    }
    wallet
        .balance
        .checked_sub(amount)
        .ok_or_else(|| MarketError::insufficient_funds(wallet.user, wallet.balance, amount))
}

/// Stage a payment of `amount` from `payer` to `payee` into `batch`
///
/// Returns the payer's balance after the payment. Paying oneself is allowed
/// when the balance covers the amount and leaves the balance unchanged.
pub(crate) fn stage_payment(
    batch: &mut WriteBatch,
    payer: &Wallet,
    payee: &Wallet,
    amount: Decimal,
    operation: &str,
) -> Result<Decimal, MarketError> {
    let payer_balance = debited(payer, amount)?;

    if payer.user == payee.user {
        batch.set_balance(payer.user, payer.balance);
        return Ok(payer.balance);
    }

    let payee_balance = credited(payee, amount, operation)?;
    batch
        .set_balance(payer.user, payer_balance)
        .set_balance(payee.user, payee_balance);
    Ok(payer_balance)
}

/// Manages wallets and their balances on top of a record store
pub struct WalletLedger<S: RecordStore> {
    store: Arc<S>,
    vault: KeyVault,
    /// Shared with the exchange so trades and transfers contend on the same wallet locks
    locks: Arc<EntityLocks>,
    chain: Arc<dyn ChainGateway>,
}

impl<S: RecordStore> WalletLedger<S> {
    /// Create a ledger that settles withdrawals through [`SimulatedChain`]
    pub fn new(store: Arc<S>, vault: KeyVault, locks: Arc<EntityLocks>) -> Self {
        Self {
            store,
            vault,
            locks,
            chain: Arc::new(SimulatedChain),
        }
    }

    /// Replace the withdrawal gateway
    pub fn with_chain(mut self, chain: Arc<dyn ChainGateway>) -> Self {
        self.chain = chain;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    /// Create the wallet of a registered user
    ///
    /// Generates fresh key material, derives the address from it and stores
    /// the key sealed by the vault. The balance starts at zero.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store refuses the wallet (unregistered user
    /// or wallet already present) or fails.
    pub fn create_wallet(&self, user: UserId) -> Result<String, MarketError> {
        let (address, sealed) = self.new_key()?;

        if !self.store.create_wallet(user, &address, &sealed)? {
            error!(user, "wallet was not created");
            return Err(MarketError::storage(format!(
                "wallet for user {} was not created",
                user
            )));
        }

        info!(user, %address, "wallet created");
        Ok(address)
    }

    /// Fresh key material as `(address, sealed key)`
    pub(crate) fn new_key(&self) -> Result<(String, String), MarketError> {
        let key_material = vault::generate_key_material();
        let address = vault::derive_address(&key_material);
        let sealed = self.vault.encrypt(&key_material)?;
        Ok((address, sealed))
    }

    /// Deposit address of `user`, if they have a wallet
    pub fn wallet_address(&self, user: UserId) -> Result<Option<String>, MarketError> {
        Ok(self.store.get_wallet(user)?.map(|wallet| wallet.address))
    }

    /// Decrypt and return the key material of `user`'s wallet
    pub fn export_key(&self, user: UserId) -> Result<String, MarketError> {
        let wallet = self.wallet(user)?;
        self.vault.decrypt(&wallet.encrypted_key)
    }

    /// Current balance of `user`
    ///
    /// A user without a wallet has a balance of zero; only a storage failure
    /// makes this fail.
    pub fn get_balance(&self, user: UserId) -> Result<Decimal, MarketError> {
        Ok(self
            .store
            .get_wallet(user)?
            .map(|wallet| wallet.balance)
            .unwrap_or(Decimal::ZERO))
    }

    /// Ledger records where `user` sent or received funds
    pub fn history(&self, user: UserId) -> Result<Vec<LedgerTransaction>, MarketError> {
        self.store.transactions_for(user)
    }

    /// Credit `amount` from outside the marketplace
    ///
    /// # Errors
    ///
    /// - `Validation(AmountNonPositive)` if `amount <= 0`
    /// - `WalletNotFound` if the user has no wallet
    /// - `ArithmeticOverflow` if the balance would overflow
    /// - `Storage` if the commit fails; the balance is then unchanged
    pub fn deposit(
        &self,
        user: UserId,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<Receipt, MarketError> {
        validate_amount(amount)?;
        let _locks = self.locks.acquire(&[LockKey::Wallet(user)]);

        let wallet = self.wallet(user)?;
        let balance = credited(&wallet, amount, "deposit")?;

        let mut batch = WriteBatch::new();
        batch
            .set_balance(user, balance)
            .append(NewTransaction::deposit(user, amount).with_reference(reference.clone()));
        let transaction = self.commit_one(batch)?;

        info!(user, %amount, %balance, transaction, "deposit settled");
        Ok(Receipt {
            transaction,
            balance,
            reference,
        })
    }

    /// Send `amount` out of the marketplace to `destination`
    ///
    /// The record carries the reference hash returned by the chain gateway.
    ///
    /// # Errors
    ///
    /// - `Validation(AmountNonPositive)` if `amount <= 0`
    /// - `InsufficientFunds` if the balance (zero without a wallet) is below `amount`
    /// - `Storage` if the commit fails; the balance is then unchanged
    pub fn withdraw(
        &self,
        user: UserId,
        destination: &str,
        amount: Decimal,
    ) -> Result<Receipt, MarketError> {
        validate_amount(amount)?;
        let _locks = self.locks.acquire(&[LockKey::Wallet(user)]);

        let wallet = self.paying_wallet(user, amount)?;
        let balance = debited(&wallet, amount)?;
        let reference = self.chain.broadcast_withdrawal(destination, amount)?;

        let mut batch = WriteBatch::new();
        batch.set_balance(user, balance).append(
            NewTransaction::withdrawal(user, amount).with_reference(Some(reference.clone())),
        );
        let transaction = self.commit_one(batch)?;

        info!(user, %amount, destination, %balance, transaction, "withdrawal settled");
        Ok(Receipt {
            transaction,
            balance,
            reference: Some(reference),
        })
    }

    /// Move `amount` from one user's wallet to another's
    ///
    /// Both balances change in the same commit. A transfer to oneself is
    /// recorded but leaves the balance unchanged.
    ///
    /// # Errors
    ///
    /// - `Validation(AmountNonPositive)` if `amount <= 0`
    /// - `WalletNotFound` if the recipient has no wallet
    /// - `InsufficientFunds` if the sender's balance is below `amount`
    /// - `Storage` if the commit fails; neither balance changes then
    pub fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Decimal,
    ) -> Result<Receipt, MarketError> {
        validate_amount(amount)?;
        let _locks = self
            .locks
            .acquire(&[LockKey::Wallet(from), LockKey::Wallet(to)]);

        let payee = self.wallet(to)?;
        let payer = self.paying_wallet(from, amount)?;

        let mut batch = WriteBatch::new();
        let balance = stage_payment(&mut batch, &payer, &payee, amount, "transfer")?;
        let reference = vault::simulated_hash();
        batch.append(
            NewTransaction::transfer(from, to, amount).with_reference(Some(reference.clone())),
        );
        let transaction = self.commit_one(batch)?;

        info!(from, to, %amount, %balance, transaction, "transfer settled");
        Ok(Receipt {
            transaction,
            balance,
            reference: Some(reference),
        })
    }

    fn wallet(&self, user: UserId) -> Result<Wallet, MarketError> {
        self.store
            .get_wallet(user)?
            .ok_or_else(|| MarketError::wallet_not_found(user))
    }

    /// Wallet that is about to pay `amount`
    ///
    /// A missing wallet has a zero balance, so it reports `InsufficientFunds`.
    pub(crate) fn paying_wallet(
        &self,
        user: UserId,
        amount: Decimal,
    ) -> Result<Wallet, MarketError> {
        self.store
            .get_wallet(user)?
            .ok_or_else(|| MarketError::insufficient_funds(user, Decimal::ZERO, amount))
    }

    /// Commit a batch holding exactly one ledger record
    fn commit_one(&self, batch: WriteBatch) -> Result<TransactionId, MarketError> {
        let ids = self.store.commit(batch).map_err(|e| {
            error!(error = %e, "ledger commit failed");
            e
        })?;
        ids.first()
            .copied()
            .ok_or_else(|| MarketError::storage("commit returned no transaction id"))
    }
}

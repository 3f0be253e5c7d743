//! Marketplace facade
//!
//! Wires one record store, one lock table and one key vault into a
//! [`WalletLedger`] and an [`Exchange`], and adds user registration on top.

use crate::core::chain::ChainGateway;
use crate::core::exchange::Exchange;
use crate::core::ledger::WalletLedger;
use crate::core::locks::EntityLocks;
use crate::core::vault::KeyVault;
use crate::store::RecordStore;
use crate::types::{MarketError, UserId, Wallet, EXTERNAL_ACCOUNT};
use std::sync::Arc;
use tracing::info;

/// Username stored when a user registers without one
pub const ANONYMOUS: &str = "Anonymous";

/// Ledger, exchange and registration over a shared store
pub struct Marketplace<S: RecordStore> {
    store: Arc<S>,
    ledger: Arc<WalletLedger<S>>,
    exchange: Exchange<S>,
}

impl<S: RecordStore> Marketplace<S> {
    pub fn new(store: Arc<S>, vault: KeyVault) -> Self {
        let ledger = WalletLedger::new(store, vault, Arc::new(EntityLocks::new()));
        Self::from_ledger(ledger)
    }

    /// Same as [`Marketplace::new`] with withdrawals sent through `chain`
    pub fn with_chain(store: Arc<S>, vault: KeyVault, chain: Arc<dyn ChainGateway>) -> Self {
        let ledger =
            WalletLedger::new(store, vault, Arc::new(EntityLocks::new())).with_chain(chain);
        Self::from_ledger(ledger)
    }

    fn from_ledger(ledger: WalletLedger<S>) -> Self {
        let ledger = Arc::new(ledger);
        Self {
            store: Arc::clone(ledger.store()),
            exchange: Exchange::new(Arc::clone(&ledger)),
            ledger,
        }
    }

    /// Register `user` and create their wallet
    ///
    /// The user row and the wallet are written in one store call, so a
    /// failure leaves neither behind.
    ///
    /// # Arguments
    ///
    /// * `user` - The new user's id
    /// * `username` - Display name, `"Anonymous"` when absent
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - the new wallet's deposit address
    /// * `Err(MarketError::ReservedUser)` for the external account id
    /// * `Err(MarketError::UserAlreadyRegistered)` if the user exists; nothing is created
    pub fn register(&self, user: UserId, username: Option<&str>) -> Result<String, MarketError> {
        if user == EXTERNAL_ACCOUNT {
            return Err(MarketError::ReservedUser { user });
        }
        let username = username.unwrap_or(ANONYMOUS);
        let (address, sealed) = self.ledger.new_key()?;

        if !self
            .store
            .create_account(user, username, &address, &sealed)?
        {
            return Err(MarketError::UserAlreadyRegistered { user });
        }

        info!(user, username, %address, "user registered");
        Ok(address)
    }

    pub fn is_registered(&self, user: UserId) -> Result<bool, MarketError> {
        self.store.user_exists(user)
    }

    /// Mark `user` active, failing if they never registered
    pub fn ensure_registered(&self, user: UserId) -> Result<(), MarketError> {
        if !self.store.touch_user(user)? {
            return Err(MarketError::UserNotRegistered { user });
        }
        Ok(())
    }

    pub fn ledger(&self) -> &WalletLedger<S> {
        &self.ledger
    }

    pub fn exchange(&self) -> &Exchange<S> {
        &self.exchange
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// All wallets ordered by user id
    pub fn wallets(&self) -> Result<Vec<Wallet>, MarketError> {
        self.store.all_wallets()
    }
}

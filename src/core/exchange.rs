//! Exchange engine
//!
//! This module provides the `Exchange` that owns listing lifecycles and
//! settles trades through the [`WalletLedger`].
//!
//! The exchange enforces business rules such as:
//! - Listing validation (price, then name, then description)
//! - Ownership checks for cancel and relist
//! - The item state machine (`Listed -> Sold`, `Listed <-> Delisted`)
//!
//! # Settlement
//!
//! A purchase holds the item lock and both wallet locks for its whole
//! duration, re-validates the item under those locks, and commits the buyer
//! debit, seller credit, item update and purchase record as one batch.

use crate::core::ledger::{stage_payment, WalletLedger};
use crate::core::locks::LockKey;
use crate::store::{RecordStore, WriteBatch};
use crate::types::{
    Item, ItemId, ItemState, MarketError, NewItem, NewTransaction, TransactionId, UserId,
    ValidationReason, MIN_DESCRIPTION_LEN, MIN_NAME_LEN,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Outcome of a settled purchase
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    /// The item in its sold state
    pub item: Item,

    /// Id of the purchase record
    pub transaction: TransactionId,

    /// Buyer balance after paying
    pub buyer_balance: Decimal,
}

/// Check listing attributes in the order price, name, description
fn validate_listing(name: &str, description: &str, price: Decimal) -> Result<(), MarketError> {
    if price <= Decimal::ZERO {
        return Err(ValidationReason::PriceNonPositive.into());
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationReason::NameTooShort.into());
    }
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(ValidationReason::DescriptionTooShort.into());
    }
    Ok(())
}

/// Marketplace of items settled against wallet balances
pub struct Exchange<S: RecordStore> {
    store: Arc<S>,
    ledger: Arc<WalletLedger<S>>,
}

impl<S: RecordStore> Exchange<S> {
    /// Create an exchange settling through `ledger`
    ///
    /// Items are read from and written to the ledger's store, and trades take
    /// the ledger's wallet locks.
    pub fn new(ledger: Arc<WalletLedger<S>>) -> Self {
        Self {
            store: Arc::clone(ledger.store()),
            ledger,
        }
    }

    /// List a new item for sale
    ///
    /// # Arguments
    ///
    /// * `seller` - The listing user
    /// * `name` - At least 3 characters
    /// * `description` - At least 5 characters
    /// * `price` - Greater than zero
    ///
    /// # Returns
    ///
    /// * `Ok(ItemId)` of the created listing
    /// * `Err(MarketError::Validation)` naming the first violated rule
    pub fn list_item(
        &self,
        seller: UserId,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> Result<ItemId, MarketError> {
        validate_listing(name, description, price)?;

        let id = self.store.create_item(NewItem {
            name: name.to_string(),
            description: description.to_string(),
            price,
            seller,
        })?;

        info!(seller, item = id, %price, "item listed");
        Ok(id)
    }

    /// Buy a for-sale item
    ///
    /// # Arguments
    ///
    /// * `buyer` - The paying user
    /// * `id` - The item to buy
    ///
    /// # Returns
    ///
    /// * `Ok(Purchase)` with the sold item and the buyer's new balance
    /// * `Err(MarketError)` if the purchase was rejected
    ///
    /// # Errors
    ///
    /// Checked in this order, with nothing changed on failure:
    /// - `ItemNotFound` if the item does not exist
    /// - `ItemNotForSale` if it is sold or delisted
    /// - `SelfTrade` if the buyer is the seller
    /// - `InsufficientFunds` if the buyer cannot pay the price
    /// - `WalletNotFound` if the seller has no wallet to credit
    /// - `Storage` if the settlement commit fails
    pub fn buy_item(&self, buyer: UserId, id: ItemId) -> Result<Purchase, MarketError> {
        // The seller never changes, so an unlocked read is enough to pick the locks
        let seller = self.item(id)?.seller;
        let _locks = self.ledger.locks().acquire(&[
            LockKey::Item(id),
            LockKey::Wallet(buyer),
            LockKey::Wallet(seller),
        ]);

        let item = self.item(id)?;
        if !item.for_sale {
            return Err(MarketError::ItemNotForSale { item: id });
        }
        if item.seller == buyer {
            return Err(MarketError::SelfTrade { item: id, user: buyer });
        }

        let payer = self.ledger.paying_wallet(buyer, item.price)?;
        if payer.balance < item.price {
            return Err(MarketError::insufficient_funds(
                buyer,
                payer.balance,
                item.price,
            ));
        }
        let payee = self
            .store
            .get_wallet(item.seller)?
            .ok_or_else(|| MarketError::wallet_not_found(item.seller))?;

        let mut sold = item;
        sold.buyer = Some(buyer);
        sold.for_sale = false;
        sold.sold_at = Some(Utc::now());

        let mut batch = WriteBatch::new();
        let buyer_balance = stage_payment(&mut batch, &payer, &payee, sold.price, "purchase")?;
        batch
            .save_item(sold.clone())
            .append(NewTransaction::purchase(buyer, sold.seller, sold.price, id));

        let transaction = self
            .store
            .commit(batch)?
            .first()
            .copied()
            .ok_or_else(|| MarketError::storage("commit returned no transaction id"))?;

        info!(
            buyer,
            seller = sold.seller,
            item = id,
            price = %sold.price,
            transaction,
            "item sold"
        );
        Ok(Purchase {
            item: sold,
            transaction,
            buyer_balance,
        })
    }

    /// Take a listed item off sale
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item does not exist
    /// - `NotOwner` if `user` is not the seller
    /// - `NotListed` if the item is already off sale
    pub fn cancel_sale(&self, user: UserId, id: ItemId) -> Result<Item, MarketError> {
        let _locks = self.ledger.locks().acquire(&[LockKey::Item(id)]);

        let mut item = self.item(id)?;
        if item.seller != user {
            return Err(MarketError::not_owner(id, user));
        }
        if !item.for_sale {
            return Err(MarketError::NotListed { item: id });
        }

        item.for_sale = false;
        self.save(item.clone())?;

        info!(user, item = id, "sale cancelled");
        Ok(item)
    }

    /// Put a delisted item back on sale, optionally at a new price
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item does not exist
    /// - `NotOwner` if `user` is not the seller, or the item has been sold
    /// - `AlreadyListed` if the item is still for sale
    /// - `Validation(PriceNonPositive)` if `price` is given and not positive
    pub fn relist_item(
        &self,
        user: UserId,
        id: ItemId,
        price: Option<Decimal>,
    ) -> Result<Item, MarketError> {
        let _locks = self.ledger.locks().acquire(&[LockKey::Item(id)]);

        let mut item = self.item(id)?;
        match item.state() {
            _ if item.seller != user => return Err(MarketError::not_owner(id, user)),
            ItemState::Listed => return Err(MarketError::AlreadyListed { item: id }),
            // Ownership passed to the buyer for good
            ItemState::Sold => return Err(MarketError::not_owner(id, user)),
            ItemState::Delisted => {}
        }

        if let Some(price) = price {
            if price <= Decimal::ZERO {
                return Err(ValidationReason::PriceNonPositive.into());
            }
            item.price = price;
        }
        item.for_sale = true;
        self.save(item.clone())?;

        info!(user, item = id, price = %item.price, "item relisted");
        Ok(item)
    }

    /// For-sale items whose name or description contains `query`
    ///
    /// Matching is case-sensitive.
    pub fn search_items(&self, query: &str) -> Result<Vec<Item>, MarketError> {
        Ok(self
            .store
            .available_items()?
            .into_iter()
            .filter(|item| item.matches(query))
            .collect())
    }

    /// Every item currently for sale
    pub fn list_available(&self) -> Result<Vec<Item>, MarketError> {
        self.store.available_items()
    }

    /// Items `user` listed or bought
    pub fn list_user_items(&self, user: UserId) -> Result<Vec<Item>, MarketError> {
        self.store.user_items(user)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Option<Item>, MarketError> {
        self.store.get_item(id)
    }

    fn item(&self, id: ItemId) -> Result<Item, MarketError> {
        self.store
            .get_item(id)?
            .ok_or_else(|| MarketError::item_not_found(id))
    }

    fn save(&self, item: Item) -> Result<(), MarketError> {
        let mut batch = WriteBatch::new();
        batch.save_item(item);
        self.store.commit(batch)?;
        Ok(())
    }
}

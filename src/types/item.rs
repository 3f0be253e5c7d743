//! Tradable items and their listing lifecycle
//!
//! ```text
//!            cancel               relist
//!   Listed ─────────► Delisted ─────────► Listed
//!     │
//!     │ buy
//!     ▼
//!    Sold   (terminal)
//! ```

use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Item identifier, assigned by the store
pub type ItemId = u64;

/// Minimum number of characters in an item name
pub const MIN_NAME_LEN: usize = 3;

/// Minimum number of characters in an item description
pub const MIN_DESCRIPTION_LEN: usize = 5;

/// Listing state derived from an item's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// For sale and purchasable
    Listed,
    /// Withdrawn from sale by its seller, may be relisted
    Delisted,
    /// Bought; buyer assigned for good
    Sold,
}

/// A good offered on the marketplace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Immutable after creation
    pub seller: UserId,
    /// Written once, on purchase
    pub buyer: Option<UserId>,
    pub for_sale: bool,
    pub created_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn state(&self) -> ItemState {
        match (self.for_sale, self.buyer) {
            (true, _) => ItemState::Listed,
            (false, Some(_)) => ItemState::Sold,
            (false, None) => ItemState::Delisted,
        }
    }

    /// Whether `user` sold or bought this item
    pub fn belongs_to(&self, user: UserId) -> bool {
        self.seller == user || self.buyer == Some(user)
    }

    /// Case-sensitive substring match on name or description
    pub fn matches(&self, query: &str) -> bool {
        self.name.contains(query) || self.description.contains(query)
    }
}

/// Attributes of an item about to be listed
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub seller: UserId,
}

impl NewItem {
    /// Materialize the listing with its store-assigned id, in the for-sale state
    pub fn into_item(self, id: ItemId, created_at: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            seller: self.seller,
            buyer: None,
            for_sale: true,
            created_at,
            sold_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sword() -> Item {
        NewItem {
            name: "Sword".to_string(),
            description: "A sharp blade".to_string(),
            price: Decimal::new(100, 0),
            seller: 1,
        }
        .into_item(1, Utc::now())
    }

    #[test]
    fn test_new_item_starts_listed() {
        let item = sword();
        assert!(item.for_sale);
        assert_eq!(item.buyer, None);
        assert_eq!(item.sold_at, None);
        assert_eq!(item.state(), ItemState::Listed);
    }

    #[rstest]
    #[case::listed(true, None, ItemState::Listed)]
    #[case::delisted(false, None, ItemState::Delisted)]
    #[case::sold(false, Some(2), ItemState::Sold)]
    fn test_state_from_flags(
        #[case] for_sale: bool,
        #[case] buyer: Option<UserId>,
        #[case] expected: ItemState,
    ) {
        let mut item = sword();
        item.for_sale = for_sale;
        item.buyer = buyer;
        assert_eq!(item.state(), expected);
    }

    #[rstest]
    #[case("Sword", true)]
    #[case("sharp", true)]
    #[case("sword", false)]
    #[case("Shield", false)]
    fn test_matches_is_case_sensitive(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(sword().matches(query), expected);
    }

    #[test]
    fn test_belongs_to_seller_and_buyer() {
        let mut item = sword();
        item.buyer = Some(2);
        assert!(item.belongs_to(1));
        assert!(item.belongs_to(2));
        assert!(!item.belongs_to(3));
    }
}

//! Command surface
//!
//! Stands in for the chat layer: one entry point per user action, mapping a
//! [`CommandRecord`] onto the marketplace and returning a [`Reply`].
//!
//! # Components
//!
//! - `command` - Typed commands and argument parsing
//! - `reply` - Success values and their text rendering

pub mod command;
pub mod reply;

pub use command::{Command, CommandRecord};
pub use reply::Reply;

use crate::core::Marketplace;
use crate::store::RecordStore;
use crate::types::{MarketError, UserId};

/// Run one command on behalf of its user
///
/// `start` registers the user; every other command requires a registered
/// user and refreshes their last-active time before running.
///
/// # Arguments
///
/// * `market` - The marketplace to act on
/// * `record` - The command and its issuing user
///
/// # Returns
///
/// * `Ok(Reply)` describing the outcome
/// * `Err(MarketError)` with the typed rejection
pub fn execute<S: RecordStore>(
    market: &Marketplace<S>,
    record: &CommandRecord,
) -> Result<Reply, MarketError> {
    let user = record.user;

    if !matches!(record.command, Command::Start { .. }) {
        market.ensure_registered(user)?;
    }
    let ledger = market.ledger();
    let exchange = market.exchange();

    let reply = match &record.command {
        Command::Start { username } => Reply::Registered {
            address: market.register(user, username.as_deref())?,
        },
        Command::Balance => Reply::Balance {
            balance: ledger.get_balance(user)?,
            address: ledger.wallet_address(user)?,
        },
        Command::Address => Reply::Address {
            address: address_of(market, user)?,
        },
        Command::Deposit { amount, reference } => Reply::Deposited {
            amount: *amount,
            receipt: ledger.deposit(user, *amount, reference.clone())?,
        },
        Command::Withdraw {
            destination,
            amount,
        } => Reply::Withdrawn {
            destination: destination.clone(),
            amount: *amount,
            receipt: ledger.withdraw(user, destination, *amount)?,
        },
        Command::Transfer { to, amount } => Reply::Transferred {
            to: *to,
            amount: *amount,
            receipt: ledger.transfer(user, *to, *amount)?,
        },
        Command::Market => Reply::Items {
            title: "Market".to_string(),
            items: exchange.list_available()?,
        },
        Command::Search { query } => Reply::Items {
            title: format!("Results for '{}'", query),
            items: exchange.search_items(query)?,
        },
        Command::Buy { item } => Reply::Bought(exchange.buy_item(user, *item)?),
        Command::Sell {
            name,
            description,
            price,
        } => Reply::Listed {
            item: exchange.list_item(user, name, description, *price)?,
        },
        Command::Cancel { item } => Reply::Cancelled(exchange.cancel_sale(user, *item)?),
        Command::Relist { item, price } => {
            Reply::Relisted(exchange.relist_item(user, *item, *price)?)
        }
        Command::MyItems => Reply::Items {
            title: "Your items".to_string(),
            items: exchange.list_user_items(user)?,
        },
        Command::History => Reply::History {
            user,
            transactions: ledger.history(user)?,
        },
    };

    Ok(reply)
}

fn address_of<S: RecordStore>(
    market: &Marketplace<S>,
    user: UserId,
) -> Result<String, MarketError> {
    market
        .ledger()
        .wallet_address(user)?
        .ok_or_else(|| MarketError::wallet_not_found(user))
}

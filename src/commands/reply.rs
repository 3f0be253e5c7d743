//! Human-readable command results

use crate::core::{Purchase, Receipt};
use crate::types::{Item, ItemId, LedgerTransaction, UserId};
use rust_decimal::Decimal;
use std::fmt;

/// Successful outcome of a command, rendered for the chat user
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Registered {
        address: String,
    },
    Balance {
        balance: Decimal,
        address: Option<String>,
    },
    Address {
        address: String,
    },
    Deposited {
        amount: Decimal,
        receipt: Receipt,
    },
    Withdrawn {
        destination: String,
        amount: Decimal,
        receipt: Receipt,
    },
    Transferred {
        to: UserId,
        amount: Decimal,
        receipt: Receipt,
    },
    /// Listing of items under a heading (market, search, my items)
    Items {
        title: String,
        items: Vec<Item>,
    },
    Listed {
        item: ItemId,
    },
    Bought(Purchase),
    Cancelled(Item),
    Relisted(Item),
    History {
        user: UserId,
        transactions: Vec<LedgerTransaction>,
    },
}

fn write_item(f: &mut fmt::Formatter<'_>, item: &Item) -> fmt::Result {
    write!(
        f,
        "#{} {} - {:.4}: {}",
        item.id, item.name, item.price, item.description
    )
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Registered { address } => {
                write!(f, "Welcome! Your deposit address is {}", address)
            }
            Reply::Balance { balance, address } => {
                write!(f, "Balance: {:.4}", balance)?;
                if let Some(address) = address {
                    write!(f, " (address {})", address)?;
                }
                Ok(())
            }
            Reply::Address { address } => write!(f, "Deposit address: {}", address),
            Reply::Deposited { amount, receipt } => write!(
                f,
                "Deposited {:.4}, new balance {:.4}",
                amount, receipt.balance
            ),
            Reply::Withdrawn {
                destination,
                amount,
                receipt,
            } => {
                write!(f, "Withdrew {:.4} to {}", amount, destination)?;
                if let Some(hash) = &receipt.reference {
                    write!(f, " (tx {})", hash)?;
                }
                write!(f, ", new balance {:.4}", receipt.balance)
            }
            Reply::Transferred {
                to,
                amount,
                receipt,
            } => write!(
                f,
                "Sent {:.4} to user {}, new balance {:.4}",
                amount, to, receipt.balance
            ),
            Reply::Items { title, items } => {
                if items.is_empty() {
                    return write!(f, "{}: no items", title);
                }
                write!(f, "{}:", title)?;
                for item in items {
                    writeln!(f)?;
                    write_item(f, item)?;
                }
                Ok(())
            }
            Reply::Listed { item } => write!(f, "Item #{} listed for sale", item),
            Reply::Bought(purchase) => write!(
                f,
                "Bought #{} {} for {:.4}, new balance {:.4}",
                purchase.item.id, purchase.item.name, purchase.item.price, purchase.buyer_balance
            ),
            Reply::Cancelled(item) => write!(f, "Item #{} withdrawn from sale", item.id),
            Reply::Relisted(item) => {
                write!(f, "Item #{} back on sale for {:.4}", item.id, item.price)
            }
            Reply::History { user, transactions } => {
                if transactions.is_empty() {
                    return f.write_str("No transactions");
                }
                f.write_str("History:")?;
                for tx in transactions {
                    let sign = if tx.sender == *user && tx.receiver != *user {
                        '-'
                    } else {
                        '+'
                    };
                    write!(
                        f,
                        "\n#{} {} {} {}{:.4}",
                        tx.id,
                        tx.timestamp.format("%Y-%m-%d %H:%M"),
                        tx.kind,
                        sign,
                        tx.amount
                    )?;
                }
                Ok(())
            }
        }
    }
}

//! Bot command parsing
//!
//! A command arrives as a name (`deposit`, `/buy`, ...) and one free-form
//! argument string, the way the chat bot receives them. Parsing turns that
//! pair into a typed [`Command`]; it checks shapes and number formats only.
//! Business rules such as positive amounts stay with the ledger and exchange.

use crate::types::{ItemId, UserId, AMOUNT_SCALE};
use rust_decimal::Decimal;
use std::str::FromStr;

/// A user-facing marketplace action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Register and create a wallet
    Start { username: Option<String> },
    Balance,
    /// Show the deposit address
    Address,
    Deposit {
        amount: Decimal,
        reference: Option<String>,
    },
    Withdraw {
        destination: String,
        amount: Decimal,
    },
    Transfer {
        to: UserId,
        amount: Decimal,
    },
    /// List every item for sale
    Market,
    Search { query: String },
    Buy { item: ItemId },
    Sell {
        name: String,
        description: String,
        price: Decimal,
    },
    Cancel { item: ItemId },
    Relist {
        item: ItemId,
        price: Option<Decimal>,
    },
    MyItems,
    History,
}

/// A parsed command together with the user who issued it
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub user: UserId,
    pub command: Command,
}

/// Parse an amount carrying at most [`AMOUNT_SCALE`] significant decimal places
fn parse_decimal(value: &str, command: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(value)
        .map_err(|_| format!("Invalid amount '{}' for {}", value, command))?;
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(format!(
            "Amount '{}' for {} has more than {} decimal places",
            value, command, AMOUNT_SCALE
        ));
    }
    Ok(amount)
}

fn parse_id(value: &str, command: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid id '{}' for {}", value, command))
}

fn usage(syntax: &str) -> String {
    format!("Usage: {}", syntax)
}

impl Command {
    /// Parse a command name and its argument string
    ///
    /// The name is case-insensitive and may carry the bot's leading `/`.
    ///
    /// # Arguments
    ///
    /// * `name` - Command name, e.g. `deposit` or `/deposit`
    /// * `args` - Raw arguments; `None` or blank when the command takes none
    ///
    /// # Returns
    ///
    /// * `Ok(Command)` - Successfully parsed command
    /// * `Err(String)` - Unknown command or malformed arguments
    pub fn parse(name: &str, args: Option<&str>) -> Result<Command, String> {
        let name = name.trim().trim_start_matches('/').to_lowercase();
        let args = args.map(str::trim).filter(|args| !args.is_empty());
        let words: Vec<&str> = args
            .map(|a| a.split_whitespace().collect())
            .unwrap_or_default();

        let command = match name.as_str() {
            "start" => Command::Start {
                username: args.map(str::to_string),
            },
            "balance" => Command::Balance,
            "address" => Command::Address,
            "market" => Command::Market,
            "myitems" => Command::MyItems,
            "history" => Command::History,
            "deposit" => match words.as_slice() {
                [amount] => Command::Deposit {
                    amount: parse_decimal(amount, "deposit")?,
                    reference: None,
                },
                [amount, reference] => Command::Deposit {
                    amount: parse_decimal(amount, "deposit")?,
                    reference: Some(reference.to_string()),
                },
                _ => return Err(usage("deposit <amount> [reference]")),
            },
            "withdraw" => match words.as_slice() {
                [destination, amount] => Command::Withdraw {
                    destination: destination.to_string(),
                    amount: parse_decimal(amount, "withdraw")?,
                },
                _ => return Err(usage("withdraw <address> <amount>")),
            },
            "transfer" => match words.as_slice() {
                [to, amount] => Command::Transfer {
                    to: parse_id(to, "transfer")?,
                    amount: parse_decimal(amount, "transfer")?,
                },
                _ => return Err(usage("transfer <user> <amount>")),
            },
            "search" => match args {
                Some(query) => Command::Search {
                    query: query.to_string(),
                },
                None => return Err(usage("search <query>")),
            },
            "buy" => match words.as_slice() {
                [item] => Command::Buy {
                    item: parse_id(item, "buy")?,
                },
                _ => return Err(usage("buy <item>")),
            },
            "cancel" => match words.as_slice() {
                [item] => Command::Cancel {
                    item: parse_id(item, "cancel")?,
                },
                _ => return Err(usage("cancel <item>")),
            },
            "relist" => match words.as_slice() {
                [item] => Command::Relist {
                    item: parse_id(item, "relist")?,
                    price: None,
                },
                [item, price] => Command::Relist {
                    item: parse_id(item, "relist")?,
                    price: Some(parse_decimal(price, "relist")?),
                },
                _ => return Err(usage("relist <item> [price]")),
            },
            "sell" => {
                let parts: Vec<&str> = args
                    .map(|a| a.split('|').map(str::trim).collect())
                    .unwrap_or_default();
                match parts.as_slice() {
                    [name, description, price] => Command::Sell {
                        name: name.to_string(),
                        description: description.to_string(),
                        price: parse_decimal(price, "sell")?,
                    },
                    _ => return Err(usage("sell <name>|<description>|<price>")),
                }
            }
            _ => return Err(format!("Unknown command: '{}'", name)),
        };

        Ok(command)
    }

    /// Canonical command name, as typed by users
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Balance => "balance",
            Command::Address => "address",
            Command::Deposit { .. } => "deposit",
            Command::Withdraw { .. } => "withdraw",
            Command::Transfer { .. } => "transfer",
            Command::Market => "market",
            Command::Search { .. } => "search",
            Command::Buy { .. } => "buy",
            Command::Sell { .. } => "sell",
            Command::Cancel { .. } => "cancel",
            Command::Relist { .. } => "relist",
            Command::MyItems => "myitems",
            Command::History => "history",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(name: &str, args: &str) -> Result<Command, String> {
        Command::parse(name, Some(args))
    }

    #[rstest]
    #[case::plain("balance", Command::Balance)]
    #[case::slash("/balance", Command::Balance)]
    #[case::uppercase("MARKET", Command::Market)]
    #[case::padded("  myitems ", Command::MyItems)]
    #[case::history("history", Command::History)]
    #[case::address("address", Command::Address)]
    fn test_parse_argumentless_commands(#[case] name: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(name, None).unwrap(), expected);
    }

    #[test]
    fn test_parse_start_username() {
        assert_eq!(
            parse("start", "alice").unwrap(),
            Command::Start {
                username: Some("alice".to_string())
            }
        );
        assert_eq!(
            parse("start", "   ").unwrap(),
            Command::Start { username: None }
        );
    }

    #[rstest]
    #[case::amount_only("25.5", Decimal::new(255, 1), None)]
    #[case::with_reference("10 0xfeed", Decimal::new(10, 0), Some("0xfeed"))]
    fn test_parse_deposit(
        #[case] args: &str,
        #[case] amount: Decimal,
        #[case] reference: Option<&str>,
    ) {
        assert_eq!(
            parse("deposit", args).unwrap(),
            Command::Deposit {
                amount,
                reference: reference.map(str::to_string)
            }
        );
    }

    #[test]
    fn test_parse_negative_amount_is_left_to_the_ledger() {
        assert_eq!(
            parse("deposit", "-5").unwrap(),
            Command::Deposit {
                amount: Decimal::new(-5, 0),
                reference: None
            }
        );
    }

    #[test]
    fn test_parse_withdraw_and_transfer() {
        assert_eq!(
            parse("withdraw", "0xabc 10").unwrap(),
            Command::Withdraw {
                destination: "0xabc".to_string(),
                amount: Decimal::new(10, 0)
            }
        );
        assert_eq!(
            parse("transfer", "42 3.25").unwrap(),
            Command::Transfer {
                to: 42,
                amount: Decimal::new(325, 2)
            }
        );
    }

    #[test]
    fn test_parse_sell_splits_on_pipes() {
        assert_eq!(
            parse("sell", "Sword | A sharp blade, well kept | 100").unwrap(),
            Command::Sell {
                name: "Sword".to_string(),
                description: "A sharp blade, well kept".to_string(),
                price: Decimal::new(100, 0)
            }
        );
    }

    #[test]
    fn test_parse_search_keeps_whole_query() {
        assert_eq!(
            parse("search", "sharp blade").unwrap(),
            Command::Search {
                query: "sharp blade".to_string()
            }
        );
    }

    #[test]
    fn test_parse_item_commands() {
        assert_eq!(parse("buy", "3").unwrap(), Command::Buy { item: 3 });
        assert_eq!(parse("cancel", "3").unwrap(), Command::Cancel { item: 3 });
        assert_eq!(
            parse("relist", "3").unwrap(),
            Command::Relist {
                item: 3,
                price: None
            }
        );
        assert_eq!(
            parse("relist", "3 80").unwrap(),
            Command::Relist {
                item: 3,
                price: Some(Decimal::new(80, 0))
            }
        );
    }

    #[rstest]
    #[case::unknown("dance", "", "Unknown command")]
    #[case::deposit_missing_amount("deposit", "", "Usage: deposit")]
    #[case::deposit_bad_amount("deposit", "lots", "Invalid amount 'lots'")]
    #[case::withdraw_missing_destination("withdraw", "10", "Usage: withdraw")]
    #[case::transfer_bad_user("transfer", "bob 10", "Invalid id 'bob'")]
    #[case::buy_bad_item("buy", "sword", "Invalid id 'sword'")]
    #[case::buy_negative_item("buy", "-1", "Invalid id '-1'")]
    #[case::sell_two_parts("sell", "Sword|100", "Usage: sell")]
    #[case::sell_bad_price("sell", "Sword|A sharp blade|cheap", "Invalid amount 'cheap'")]
    #[case::search_empty("search", " ", "Usage: search")]
    #[case::relist_too_many("relist", "1 2 3", "Usage: relist")]
    #[case::deposit_too_precise("deposit", "1.23456", "more than 4 decimal places")]
    #[case::transfer_too_precise("transfer", "2 0.00001", "more than 4 decimal places")]
    #[case::sell_too_precise("sell", "Sword|A sharp blade|9.99999", "more than 4 decimal places")]
    #[case::relist_too_precise("relist", "1 0.12345", "more than 4 decimal places")]
    fn test_parse_errors(#[case] name: &str, #[case] args: &str, #[case] expected: &str) {
        let error = parse(name, args).unwrap_err();
        assert!(error.contains(expected), "unexpected error: {}", error);
    }

    #[test]
    fn test_name_matches_parsed_command() {
        for name in ["start", "balance", "market", "myitems", "history", "address"] {
            assert_eq!(Command::parse(name, None).unwrap().name(), name);
        }
        assert_eq!(parse("sell", "a|b|1").unwrap().name(), "sell");
    }
}

//! CSV format handling for command scripts and wallet output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to typed commands
//! - Wallet output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::commands::{Command, CommandRecord};
use crate::types::{UserId, Wallet, AMOUNT_SCALE};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the script format with columns: command, user, args.
/// The args field is optional because most commands take none.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub command: String,
    pub user: UserId,
    pub args: Option<String>,
}

/// Convert a CsvRecord to a CommandRecord
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(CommandRecord) - Successfully parsed command
/// - Err(String) - Error message naming the user and the parse failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<CommandRecord, String> {
    let command = Command::parse(&csv_record.command, csv_record.args.as_deref())
        .map_err(|e| format!("{} (user {})", e, csv_record.user))?;

    Ok(CommandRecord {
        user: csv_record.user,
        command,
    })
}

/// Render a balance with four decimal places
///
/// A balance with finer precision is printed in full rather than rounded.
fn format_balance(balance: Decimal) -> String {
    if balance.normalize().scale() > AMOUNT_SCALE {
        balance.normalize().to_string()
    } else {
        format!("{:.4}", balance)
    }
}

/// Write wallet states to CSV format
///
/// Writes wallets in CSV format with columns: user, address, balance
/// Wallets are sorted by user ID for deterministic output.
///
/// # Arguments
///
/// * `wallets` - Slice of wallets to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_wallets_csv(wallets: &[Wallet], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["user", "address", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_wallets = wallets.to_vec();
    sorted_wallets.sort_by_key(|wallet| wallet.user);

    for wallet in sorted_wallets {
        writer
            .write_record(&[
                wallet.user.to_string(),
                wallet.address,
                format_balance(wallet.balance),
            ])
            .map_err(|e| format!("Failed to write wallet record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn csv_record(command: &str, user: UserId, args: Option<&str>) -> CsvRecord {
        CsvRecord {
            command: command.to_string(),
            user,
            args: args.map(|s| s.to_string()),
        }
    }

    fn wallet(user: UserId, balance: Decimal) -> Wallet {
        let mut wallet = Wallet::new(user, format!("0x{:040}", user), "sealed".to_string());
        wallet.balance = balance;
        wallet
    }

    #[rstest]
    #[case("deposit", Some("100.0"), Command::Deposit { amount: Decimal::new(1000, 1), reference: None })]
    #[case("DEPOSIT", Some("100.0"), Command::Deposit { amount: Decimal::new(1000, 1), reference: None })]
    #[case("balance", None, Command::Balance)]
    #[case("balance", Some(""), Command::Balance)]
    #[case("buy", Some("7"), Command::Buy { item: 7 })]
    fn test_convert_csv_record_valid(
        #[case] command: &str,
        #[case] args: Option<&str>,
        #[case] expected: Command,
    ) {
        let record = convert_csv_record(csv_record(command, 3, args)).unwrap();
        assert_eq!(record.user, 3);
        assert_eq!(record.command, expected);
    }

    #[rstest]
    #[case::unknown_command("fly", None, "Unknown command")]
    #[case::missing_amount("deposit", None, "Usage: deposit")]
    #[case::invalid_amount("deposit", Some("not_a_number"), "Invalid amount")]
    fn test_convert_csv_record_errors(
        #[case] command: &str,
        #[case] args: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let error = convert_csv_record(csv_record(command, 9, args)).unwrap_err();
        assert!(error.contains(expected_error));
        assert!(error.contains("user 9"));
    }

    #[rstest]
    #[case::empty(vec![], "user,address,balance\n")]
    #[case::single(
        vec![wallet(1, Decimal::new(1000000, 4))],
        "user,address,balance\n1,0x0000000000000000000000000000000000000001,100.0000\n"
    )]
    #[case::sorted_by_user(
        vec![wallet(3, Decimal::ZERO), wallet(1, Decimal::ZERO)],
        "user,address,balance\n1,0x0000000000000000000000000000000000000001,0.0000\n3,0x0000000000000000000000000000000000000003,0.0000\n"
    )]
    #[case::finer_precision_not_rounded(
        vec![wallet(2, Decimal::new(1_234_567, 6))],
        "user,address,balance\n2,0x0000000000000000000000000000000000000002,1.234567\n"
    )]
    #[case::four_decimal_precision(
        vec![wallet(2, Decimal::new(1001234, 4))],
        "user,address,balance\n2,0x0000000000000000000000000000000000000002,100.1234\n"
    )]
    fn test_write_wallets_csv(#[case] wallets: Vec<Wallet>, #[case] expected_output: &str) {
        let mut output = Vec::new();
        write_wallets_csv(&wallets, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }
}

//! End-to-end integration tests
//!
//! These tests drive the complete replay pipeline from a CSV command script
//! to the wallet CSV. Fixture tests:
//! 1. Read input.csv from a fixture directory
//! 2. Replay every command through a fresh marketplace
//! 3. Generate the wallet CSV
//! 4. Check every address column and compare users and balances with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path trading
//! - Listing lifecycle (cancel, relist, sold items)
//! - Error conditions (insufficient funds, validation, unregistered users, self trade)
//! - Edge cases (precision, malformed rows)
//!
//! Each fixture runs with both strategies. The async strategy uses single-command
//! batches there, since fixtures depend on cross-user ordering.

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use chat_market_ledger::cli::StrategyType;
    use chat_market_ledger::strategy::{create_strategy, BatchConfig, LedgerConfig};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use std::fmt::Write as _;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    fn batch_config(strategy_type: &StrategyType) -> Option<BatchConfig> {
        match strategy_type {
            StrategyType::Sync => None,
            StrategyType::Async => Some(BatchConfig::new(1, 2)),
        }
    }

    /// Replay a script file and return the raw wallet CSV
    fn replay(
        input_path: &Path,
        strategy_type: StrategyType,
        config: Option<BatchConfig>,
        ledger: LedgerConfig,
    ) -> String {
        let strategy = create_strategy(strategy_type, config, ledger);

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        strategy
            .process(input_path, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay commands: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e))
    }

    fn write_script(script: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(script.as_bytes())
            .expect("Failed to write script");
        file.flush().expect("Failed to flush script");
        file
    }

    /// Drop the address column after checking its shape
    ///
    /// Addresses derive from freshly generated keys, so only their format is stable.
    fn normalize(output: &str) -> String {
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("user,address,balance"));

        let mut normalized = String::from("user,balance\n");
        for line in lines {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3, "Unexpected wallet row: {}", line);
            let address = fields[1];
            assert_eq!(address.len(), 42, "Unexpected address: {}", address);
            assert!(address.starts_with("0x"));
            assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
            writeln!(normalized, "{},{}", fields[0], fields[2]).unwrap();
        }
        normalized
    }

    /// Run a test fixture by replaying input.csv and comparing with expected.csv
    ///
    /// # Arguments
    ///
    /// * `fixture_name` - Name of the fixture directory (e.g., "happy_path")
    /// * `strategy_type` - Replay strategy to use (Sync or Async)
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected (after normalization)
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let config = batch_config(&strategy_type);
        let actual_output = normalize(&replay(
            Path::new(&input_path),
            strategy_type.clone(),
            config,
            LedgerConfig::default(),
        ));

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both replay strategies
    #[rstest]
    #[case("happy_path")]
    #[case("insufficient_funds")]
    #[case("transfers")]
    #[case("listing_lifecycle")]
    #[case("validation_errors")]
    #[case("self_trade")]
    #[case("unregistered_users")]
    #[case("malformed_data")]
    #[case("precision_testing")]
    #[case("read_only_commands")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    #[rstest]
    fn test_configured_vault_key(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let script = write_script("command,user,args\nstart,1\ndeposit,1,3\n");
        let ledger = LedgerConfig {
            encryption_key: Some(BASE64.encode([9u8; 32])),
        };
        let config = batch_config(&strategy);

        let output = normalize(&replay(script.path(), strategy, config, ledger));
        assert_eq!(output, "user,balance\n1,3.0000\n");
    }

    #[test]
    fn test_invalid_vault_key_is_fatal() {
        let script = write_script("command,user,args\nstart,1\n");
        let strategy = create_strategy(
            StrategyType::Sync,
            None,
            LedgerConfig {
                encryption_key: Some("too-short".to_string()),
            },
        );

        let mut output = Vec::new();
        assert!(strategy.process(script.path(), &mut output).is_err());
        assert!(output.is_empty());
    }

    #[rstest]
    fn test_missing_input_is_fatal(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let strategy = create_strategy(strategy, None, LedgerConfig::default());
        let mut output = Vec::new();
        assert!(strategy
            .process(Path::new("tests/fixtures/does_not_exist.csv"), &mut output)
            .is_err());
    }

    #[test]
    fn test_addresses_are_unique() {
        let mut script = String::from("command,user,args\n");
        for user in 1..=50 {
            writeln!(script, "start,{}", user).unwrap();
        }
        let script = write_script(&script);

        let output = replay(script.path(), StrategyType::Sync, None, LedgerConfig::default());
        let addresses: HashSet<&str> = output
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(addresses.len(), 50);
    }

    /// Many buyers race for a few items in large async batches
    ///
    /// Cross-user order is undefined there, so only the money rules are
    /// checked: no balance goes negative and transfers or purchases create or
    /// destroy nothing.
    #[test]
    fn test_async_replay_conserves_money() {
        let mut script = String::from("command,user,args\n");
        for user in 1..=40 {
            writeln!(script, "start,{}", user).unwrap();
            writeln!(script, "deposit,{},100", user).unwrap();
        }
        for seller in 1..=5 {
            writeln!(script, "sell,{},Relic {}|Ancient relic number {}|60", seller, seller, seller)
                .unwrap();
        }
        for buyer in 6..=40 {
            writeln!(script, "buy,{},{}", buyer, buyer % 5 + 1).unwrap();
            writeln!(script, "transfer,{},{} 30", buyer, buyer % 7 + 1).unwrap();
        }
        let script = write_script(&script);

        let output = replay(
            script.path(),
            StrategyType::Async,
            Some(BatchConfig::new(1000, 8)),
            LedgerConfig::default(),
        );

        let balances: Vec<Decimal> = output
            .lines()
            .skip(1)
            .map(|line| Decimal::from_str(line.split(',').nth(2).unwrap()).unwrap())
            .collect();
        assert_eq!(balances.len(), 40);
        assert!(balances.iter().all(|balance| *balance >= Decimal::ZERO));
        assert_eq!(balances.iter().sum::<Decimal>(), Decimal::from(4000));
    }
}

//! Optional settlement gateway
//!
//! Withdrawals may be forwarded to an external network. The ledger only asks
//! the gateway for a reference hash to attach to the withdrawal record; balance
//! truth always lives in the record store.

use crate::core::vault;
use crate::types::MarketError;
use rust_decimal::Decimal;

/// Capability to push a withdrawal out of the marketplace
pub trait ChainGateway: Send + Sync {
    /// Send `amount` to `destination` and return the reference hash
    fn broadcast_withdrawal(&self, destination: &str, amount: Decimal)
        -> Result<String, MarketError>;
}

/// Gateway that settles nothing and returns a random hash
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedChain;

impl ChainGateway for SimulatedChain {
    fn broadcast_withdrawal(
        &self,
        _destination: &str,
        _amount: Decimal,
    ) -> Result<String, MarketError> {
        Ok(vault::simulated_hash())
    }
}

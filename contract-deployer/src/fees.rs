use crate::chain::EthClient;
use ethers_core::{
    types::{transaction::eip2718::TypedTransaction, Address, U256},
    utils::format_ether,
};
use ethers_providers::Middleware;
use thiserror::Error;

/// Flat surcharge collected on top of the network gas fee, in percent.
pub const PLATFORM_FEE_PERCENT: u64 = 2;

/// Cost breakdown for a pending deployment, computed before any on-chain
/// write. All amounts are wei; conversion to display units happens only at
/// the response boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentQuote {
    pub user_balance: U256,
    pub gas_units: U256,
    pub gas_price: U256,
    pub gas_fee: U256,
    pub transaction_fee: U256,
    pub total_cost: U256,
}

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("fee arithmetic overflowed")]
    Overflow,
    #[error("{0}")]
    Provider(anyhow::Error),
}

impl DeploymentQuote {
    /// Integer arithmetic throughout: the surcharge is
    /// `floor(gas_units * gas_price * 2 / 100)`.
    pub fn new(
        user_balance: U256,
        gas_units: U256,
        gas_price: U256,
    ) -> Result<Self, EstimateError> {
        let gas_fee = gas_units
            .checked_mul(gas_price)
            .ok_or(EstimateError::Overflow)?;
        let transaction_fee = gas_fee
            .checked_mul(PLATFORM_FEE_PERCENT.into())
            .ok_or(EstimateError::Overflow)?
            / U256::from(100);
        let total_cost = gas_fee
            .checked_add(transaction_fee)
            .ok_or(EstimateError::Overflow)?;
        Ok(Self {
            user_balance,
            gas_units,
            gas_price,
            gas_fee,
            transaction_fee,
            total_cost,
        })
    }

    pub fn covers_total_cost(&self) -> bool {
        self.user_balance >= self.total_cost
    }
}

/// Read-only quote over live chain data: balance, gas estimate and gas price.
pub async fn estimate(
    client: &EthClient,
    tx: &TypedTransaction,
    payer: Address,
) -> Result<DeploymentQuote, EstimateError> {
    let user_balance = client
        .get_balance(payer, None)
        .await
        .map_err(|err| EstimateError::Provider(anyhow::Error::new(err)))?;
    let gas_units = client
        .estimate_gas(tx, None)
        .await
        .map_err(|err| EstimateError::Provider(anyhow::Error::new(err)))?;
    let gas_price = client
        .get_gas_price()
        .await
        .map_err(|err| EstimateError::Provider(anyhow::Error::new(err)))?;
    DeploymentQuote::new(user_balance, gas_units, gas_price)
}

/// Renders wei as a trimmed ether decimal: `"0.0"`, `"1.5"`, never
/// `"1.500000000000000000"`.
pub fn format_native(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{integer}.0")
            } else {
                format!("{integer}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quote(balance: u64, gas_units: u64, gas_price: u64) -> DeploymentQuote {
        DeploymentQuote::new(balance.into(), gas_units.into(), gas_price.into())
            .expect("no overflow")
    }

    #[test]
    fn transaction_fee_is_two_percent_truncated() {
        // 21000 * 10 = 210000 gas fee, 2% = 4200
        let q = quote(1_000_000, 21_000, 10);
        assert_eq!(q.gas_fee, U256::from(210_000));
        assert_eq!(q.transaction_fee, U256::from(4_200));
        assert_eq!(q.total_cost, U256::from(214_200));

        // 3 * 33 = 99, 2% of 99 = 1.98 -> truncates to 1
        let q = quote(0, 3, 33);
        assert_eq!(q.transaction_fee, U256::from(1));

        // below 50 wei the surcharge truncates to zero
        let q = quote(0, 7, 7);
        assert_eq!(q.gas_fee, U256::from(49));
        assert_eq!(q.transaction_fee, U256::zero());
    }

    #[test]
    fn balance_gate_is_inclusive() {
        assert!(quote(214_200, 21_000, 10).covers_total_cost());
        assert!(!quote(214_199, 21_000, 10).covers_total_cost());
        assert!(!quote(0, 21_000, 10).covers_total_cost());
    }

    #[test]
    fn overflowing_estimate_is_an_error() {
        let err = DeploymentQuote::new(U256::zero(), U256::MAX, U256::from(2)).unwrap_err();
        assert!(matches!(err, EstimateError::Overflow));
    }

    #[test]
    fn wei_formats_as_trimmed_ether() {
        assert_eq!(format_native(U256::zero()), "0.0");
        assert_eq!(format_native(U256::exp10(18)), "1.0");
        assert_eq!(
            format_native(U256::exp10(18) * U256::from(3) / U256::from(2)),
            "1.5"
        );
        assert_eq!(format_native(U256::from(1)), "0.000000000000000001");
    }
}

use contract_deployer::{
    account::{CreatedWallet, NetworkBalances, TransferOutcome},
    fees, Chain, DeploymentQuote, DeploymentResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt::Display};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub message: String,
    pub user_balance: String,
    pub gas_fee: String,
    pub transaction_fee: String,
    pub contract_address: String,
    pub explorer_url: String,
    pub abi: Value,
}

impl DeployResponse {
    pub fn new(chain: Chain, result: DeploymentResult) -> Self {
        Self {
            message: format!("{chain} contract deployed successfully!"),
            user_balance: fees::format_native(result.quote.user_balance),
            gas_fee: fees::format_native(result.quote.gas_fee),
            transaction_fee: fees::format_native(result.quote.transaction_fee),
            contract_address: result.contract_address,
            explorer_url: result.explorer_url,
            abi: result.abi,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub user_balance: String,
    pub gas_fee: String,
    pub transaction_fee: String,
    pub total_cost: String,
}

impl From<&DeploymentQuote> for QuoteResponse {
    fn from(quote: &DeploymentQuote) -> Self {
        Self {
            user_balance: fees::format_native(quote.user_balance),
            gas_fee: fees::format_native(quote.gas_fee),
            transaction_fee: fees::format_native(quote.transaction_fee),
            total_cost: fees::format_native(quote.total_cost),
        }
    }
}

/// Error body for the deployment routes. Only `error` is always present;
/// the insufficient-balance case attaches the cost breakdown and a failed
/// fee settlement attaches the live contract address.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Display) -> Self {
        Self {
            error: error.to_string(),
            ..Default::default()
        }
    }

    pub fn insufficient_balance(chain: Chain, quote: &DeploymentQuote) -> Self {
        let symbol = chain.native_symbol();
        let total = fees::format_native(quote.total_cost);
        let balance = fees::format_native(quote.user_balance);
        Self {
            error: format!(
                "Insufficient balance. You need at least {total} {symbol} to cover the gas fee \
                 and transaction fee, but your balance is {balance} {symbol}."
            ),
            user_balance: Some(balance),
            gas_fee: Some(fees::format_native(quote.gas_fee)),
            transaction_fee: Some(fees::format_native(quote.transaction_fee)),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WalletResponse {
    pub success: bool,
    pub message: String,
    pub wallet: WalletJson,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletJson {
    pub address: String,
    pub private_key: String,
    pub mnemonic: String,
}

impl From<CreatedWallet> for WalletResponse {
    fn from(wallet: CreatedWallet) -> Self {
        Self {
            success: true,
            message: "Wallet successfully created".to_string(),
            wallet: WalletJson {
                address: wallet.address,
                private_key: wallet.private_key,
                mnemonic: wallet.mnemonic,
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BalancesResponse {
    pub success: bool,
    pub balances: BTreeMap<String, NetworkBalancesJson>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkBalancesJson {
    pub address: String,
    pub native: Option<String>,
    pub tokens: BTreeMap<String, Option<String>>,
}

impl BalancesResponse {
    pub fn new(balances: BTreeMap<String, NetworkBalances>) -> Self {
        Self {
            success: true,
            balances: balances
                .into_iter()
                .map(|(network, balances)| {
                    (
                        network,
                        NetworkBalancesJson {
                            address: balances.address,
                            native: balances.native,
                            tokens: balances.tokens,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransferResponse {
    pub success: bool,
    pub results: BTreeMap<String, TransferOutcomeJson>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcomeJson {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TransferOutcome> for TransferOutcomeJson {
    fn from(outcome: TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Sent { message, tx_hash } => Self {
                success: true,
                message: Some(message),
                tx_hash: Some(tx_hash),
                error: None,
            },
            TransferOutcome::Failed { error } => Self {
                success: false,
                message: None,
                tx_hash: None,
                error: Some(error),
            },
        }
    }
}

impl TransferResponse {
    pub fn new(results: BTreeMap<String, TransferOutcome>) -> Self {
        Self {
            success: true,
            results: results
                .into_iter()
                .map(|(key, outcome)| (key, outcome.into()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccountErrorResponse {
    pub success: bool,
    pub error: String,
}

impl AccountErrorResponse {
    pub fn new(error: impl Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

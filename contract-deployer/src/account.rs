use crate::{
    chain::{self, PerEnvironment},
    fees,
};
use anyhow::{anyhow, Context};
use ethers_contract::Contract;
use ethers_core::{
    abi::Abi,
    types::{Address, TransactionRequest, U256},
    utils::{parse_ether, to_checksum},
};
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::{
    coins_bip39::{English, Mnemonic},
    LocalWallet, MnemonicBuilder, Signer, WalletError,
};
use futures::future::join_all;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Gas limit for a plain value transfer.
const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Token catalog and rpc endpoints for the wallet routes, loaded from a json
/// file at startup. Keyed by network name; the per-network `environment` flag
/// picks which of the two rpc urls is live.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworksConfig {
    pub networks: BTreeMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkConfig {
    pub environment: chain::Environment,
    pub rpc_url: PerEnvironment<Url>,
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenConfig {
    pub contract_address: Address,
    pub abi: Abi,
}

impl NetworkConfig {
    pub fn active_rpc_url(&self) -> &Url {
        self.rpc_url.get(self.environment)
    }
}

impl NetworksConfig {
    pub fn from_file(path: &Path) -> Result<Self, AccountError> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read networks config {}", path.display()))
            .map_err(AccountError::Config)?;
        let config: NetworksConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse networks config {}", path.display()))
            .map_err(AccountError::Config)?;
        if config.networks.is_empty() {
            return Err(AccountError::Config(anyhow!(
                "networks config {} declares no networks",
                path.display()
            )));
        }
        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("{0}")]
    Config(anyhow::Error),
    #[error("failed to generate wallet: {0}")]
    Wallet(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWallet {
    pub address: String,
    pub private_key: String,
    pub mnemonic: String,
}

/// Balances of one account on one network. Lookups that fail are reported as
/// `None` instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBalances {
    pub address: String,
    pub native: Option<String>,
    pub tokens: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Native,
    Token,
}

#[derive(Error, Debug)]
#[error("invalid transfer type `{0}`, expected \"native\" or \"token\"")]
pub struct InvalidTransferKind(String);

impl FromStr for TransferKind {
    type Err = InvalidTransferKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "native" => Ok(TransferKind::Native),
            "token" => Ok(TransferKind::Token),
            other => Err(InvalidTransferKind(other.to_string())),
        }
    }
}

/// Outcome of a single transfer attempt. Keys in the result map are the
/// network name, or `<network>-<token>` for token transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Sent { message: String, tx_hash: String },
    Failed { error: String },
}

/// Wallet operations spanning every configured network. Each request carries
/// its own signing key, so the service itself holds only the catalog.
pub struct AccountService {
    config: NetworksConfig,
}

impl AccountService {
    pub fn new(config: NetworksConfig) -> Self {
        Self { config }
    }

    /// Generates a fresh 12-word mnemonic and the account derived from it.
    /// The same key pair is valid on every supported network.
    pub fn create_wallet(&self) -> Result<CreatedWallet, AccountError> {
        let mnemonic = Mnemonic::<English>::new_with_count(&mut rand::thread_rng(), 12)
            .map_err(|err| AccountError::Wallet(anyhow!(err)))?;
        let phrase = mnemonic.to_phrase();
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase.as_str())
            .build()
            .map_err(|err| AccountError::Wallet(anyhow!(err)))?;
        Ok(CreatedWallet {
            address: to_checksum(&wallet.address(), None),
            private_key: format!("0x{}", hex::encode(wallet.signer().to_bytes())),
            mnemonic: phrase,
        })
    }

    /// Native and token balances of the key's account on every network,
    /// fetched concurrently. A network that cannot be reached still shows up,
    /// with its balances nulled out.
    #[instrument(skip_all)]
    pub async fn balances(
        &self,
        private_key: &str,
    ) -> Result<BTreeMap<String, NetworkBalances>, AccountError> {
        let address = address_of(private_key)?;

        let lookups = self.config.networks.iter().map(|(name, network)| async move {
            (name.clone(), network_balances(network, address).await)
        });
        Ok(join_all(lookups).await.into_iter().collect())
    }

    /// Sends `amount` (in display units) to `recipient` on every configured
    /// network. Failures are isolated per network; for token transfers, per
    /// token.
    #[instrument(skip_all, fields(kind = ?kind))]
    pub async fn transfer(
        &self,
        private_key: &str,
        recipient: &str,
        amount: &str,
        kind: TransferKind,
    ) -> Result<BTreeMap<String, TransferOutcome>, AccountError> {
        // Reject malformed input before touching any chain.
        address_of(private_key)?;
        let to: Address = recipient
            .parse()
            .map_err(|_| AccountError::InvalidAddress(recipient.to_string()))?;
        let wei = parse_ether(amount).map_err(|err| AccountError::InvalidAmount(err.to_string()))?;

        let transfers = self.config.networks.iter().map(|(name, network)| async move {
            match kind {
                TransferKind::Native => {
                    vec![(name.clone(), native_transfer(name, network, private_key, to, wei).await)]
                }
                TransferKind::Token => {
                    token_transfers(name, network, private_key, to, wei).await
                }
            }
        });
        Ok(join_all(transfers).await.into_iter().flatten().collect())
    }
}

fn address_of(private_key: &str) -> Result<Address, AccountError> {
    let wallet: LocalWallet = chain::normalize_private_key(private_key)
        .parse()
        .map_err(|err: WalletError| AccountError::InvalidPrivateKey(err.to_string()))?;
    Ok(wallet.address())
}

fn provider(network: &NetworkConfig) -> Result<Provider<Http>, anyhow::Error> {
    Provider::<Http>::try_from(network.active_rpc_url().as_str()).map_err(anyhow::Error::new)
}

async fn network_balances(network: &NetworkConfig, address: Address) -> NetworkBalances {
    let checksummed = to_checksum(&address, None);
    let provider = match provider(network) {
        Ok(provider) => Arc::new(provider),
        Err(err) => {
            tracing::warn!(url = %network.active_rpc_url(), error = %err, "rpc endpoint unusable");
            return NetworkBalances {
                address: checksummed,
                native: None,
                tokens: network.tokens.keys().map(|name| (name.clone(), None)).collect(),
            };
        }
    };

    let native = match provider.get_balance(address, None).await {
        Ok(balance) => Some(fees::format_native(balance)),
        Err(err) => {
            tracing::warn!(error = %err, "native balance lookup failed");
            None
        }
    };

    let mut tokens = BTreeMap::new();
    for (token_name, token) in &network.tokens {
        let balance = token_balance(&provider, token, address).await;
        if let Err(err) = &balance {
            tracing::warn!(token = token_name, error = %err, "token balance lookup failed");
        }
        tokens.insert(token_name.clone(), balance.ok());
    }

    NetworkBalances {
        address: checksummed,
        native,
        tokens,
    }
}

async fn token_balance(
    provider: &Arc<Provider<Http>>,
    token: &TokenConfig,
    address: Address,
) -> Result<String, anyhow::Error> {
    let contract = Contract::new(token.contract_address, token.abi.clone(), provider.clone());
    let balance: U256 = contract
        .method::<_, U256>("balanceOf", address)?
        .call()
        .await?;
    Ok(fees::format_native(balance))
}

async fn native_transfer(
    network_name: &str,
    network: &NetworkConfig,
    private_key: &str,
    to: Address,
    wei: U256,
) -> TransferOutcome {
    let result = async {
        let client = chain::connect(network.active_rpc_url(), private_key)
            .await
            .map_err(|err| anyhow!(err))?;
        let tx = TransactionRequest::new()
            .to(to)
            .value(wei)
            .gas(NATIVE_TRANSFER_GAS);
        let receipt = client
            .send_transaction(tx, None)
            .await
            .map_err(|err| anyhow!(err))?
            .await?
            .ok_or_else(|| anyhow!("transfer dropped from the mempool"))?;
        Ok::<_, anyhow::Error>(receipt.transaction_hash)
    }
    .await;

    match result {
        Ok(tx_hash) => TransferOutcome::Sent {
            message: "Native transfer successful".to_string(),
            tx_hash: format!("{tx_hash:#x}"),
        },
        Err(err) => TransferOutcome::Failed {
            error: format!("Transfer failed on {network_name}: {err}"),
        },
    }
}

async fn token_transfers(
    network_name: &str,
    network: &NetworkConfig,
    private_key: &str,
    to: Address,
    wei: U256,
) -> Vec<(String, TransferOutcome)> {
    let mut results = Vec::with_capacity(network.tokens.len());
    for (token_name, token) in &network.tokens {
        let key = format!("{network_name}-{token_name}");
        let outcome =
            match token_transfer(network, token, private_key, to, wei).await {
                Ok(tx_hash) => TransferOutcome::Sent {
                    message: format!("Token {token_name} transfer successful"),
                    tx_hash: format!("{tx_hash:#x}"),
                },
                Err(err) => TransferOutcome::Failed {
                    error: format!(
                        "Failed to transfer token {token_name} on {network_name}: {err}"
                    ),
                },
            };
        results.push((key, outcome));
    }
    results
}

async fn token_transfer(
    network: &NetworkConfig,
    token: &TokenConfig,
    private_key: &str,
    to: Address,
    wei: U256,
) -> Result<ethers_core::types::H256, anyhow::Error> {
    let client = chain::connect(network.active_rpc_url(), private_key)
        .await
        .map_err(|err| anyhow!(err))?;
    let contract = Contract::new(token.contract_address, token.abi.clone(), client);
    let call = contract.method::<_, bool>("transfer", (to, wei))?;
    let receipt = call
        .send()
        .await
        .map_err(|err| anyhow!(err.to_string()))?
        .await?
        .ok_or_else(|| anyhow!("transfer dropped from the mempool"))?;
    Ok(receipt.transaction_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> NetworksConfig {
        serde_json::from_value(json!({
            "networks": {
                "ethereum": {
                    "environment": 0,
                    "rpcUrl": {
                        "testnet": "https://rpc.sepolia.org",
                        "mainnet": "https://eth.llamarpc.com"
                    },
                    "tokens": {
                        "usdt": {
                            "contractAddress": "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                            "abi": [
                                {
                                    "type": "function",
                                    "name": "balanceOf",
                                    "stateMutability": "view",
                                    "inputs": [{ "name": "owner", "type": "address" }],
                                    "outputs": [{ "name": "", "type": "uint256" }]
                                }
                            ]
                        }
                    }
                },
                "celo": {
                    "environment": 1,
                    "rpcUrl": {
                        "testnet": "https://alfajores-forno.celo-testnet.org",
                        "mainnet": "https://forno.celo.org"
                    }
                }
            }
        }))
        .expect("valid config")
    }

    #[test]
    fn networks_config_deserializes_with_per_environment_rpc() {
        let config = config();
        assert_eq!(config.networks.len(), 2);

        let ethereum = &config.networks["ethereum"];
        assert_eq!(ethereum.environment, chain::Environment::Testnet);
        assert_eq!(ethereum.active_rpc_url().as_str(), "https://rpc.sepolia.org/");
        assert_eq!(ethereum.tokens.len(), 1);

        let celo = &config.networks["celo"];
        assert_eq!(celo.environment, chain::Environment::Mainnet);
        assert_eq!(celo.active_rpc_url().as_str(), "https://forno.celo.org/");
        assert!(celo.tokens.is_empty());
    }

    #[test]
    fn created_wallets_are_unique_and_well_formed() {
        let service = AccountService::new(config());
        let first = service.create_wallet().expect("wallet");
        let second = service.create_wallet().expect("wallet");

        assert_ne!(first.address, second.address);
        assert_eq!(first.mnemonic.split_whitespace().count(), 12);
        assert!(first.address.starts_with("0x") && first.address.len() == 42);
        assert!(first.private_key.starts_with("0x") && first.private_key.len() == 66);

        // The returned key must derive the returned address.
        assert_eq!(address_of(&first.private_key).unwrap(), first.address.parse().unwrap());
    }

    #[test]
    fn transfer_kind_parses_lowercase_names_only() {
        assert_eq!("native".parse::<TransferKind>().unwrap(), TransferKind::Native);
        assert_eq!("token".parse::<TransferKind>().unwrap(), TransferKind::Token);
        assert!("Native".parse::<TransferKind>().is_err());
        assert!("erc20".parse::<TransferKind>().is_err());
    }

    #[tokio::test]
    async fn transfer_rejects_malformed_input_before_any_rpc() {
        let service = AccountService::new(config());

        let err = service
            .transfer("not-a-key", "0x0000000000000000000000000000000000000001", "1", TransferKind::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidPrivateKey(_)));

        let key = "0x0123456789012345678901234567890123456789012345678901234567890123";
        let err = service
            .transfer(key, "nowhere", "1", TransferKind::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidAddress(_)));

        let err = service
            .transfer(key, "0x0000000000000000000000000000000000000001", "one", TransferKind::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount(_)));
    }
}

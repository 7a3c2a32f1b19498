use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Provider};
use ethers_signers::{LocalWallet, WalletError};
use serde::Deserialize;
use std::{fmt, sync::Arc};
use thiserror::Error;
use url::Url;

/// Client used for every on-chain interaction: an http JSON-RPC provider
/// with a request-scoped signing key on top.
pub type EthClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Bnb,
    Celo,
}

impl Chain {
    /// Short name used in route paths and metric labels.
    pub fn route_name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "eth",
            Chain::Bnb => "bnb",
            Chain::Celo => "celo",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETH",
            Chain::Bnb => "BNB",
            Chain::Celo => "CELO",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chain::Ethereum => "Ethereum",
            Chain::Bnb => "BNB",
            Chain::Celo => "Celo",
        };
        f.write_str(name)
    }
}

/// Deployment target environment. Requests select it with a numeric flag:
/// 0 for testnet, 1 for mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Testnet,
    Mainnet,
}

#[derive(Error, Debug)]
#[error("environment must be 0 (testnet) or 1 (mainnet), got {0}")]
pub struct InvalidEnvironment(pub u8);

impl TryFrom<u8> for Environment {
    type Error = InvalidEnvironment;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Environment::Testnet),
            1 => Ok(Environment::Mainnet),
            other => Err(InvalidEnvironment(other)),
        }
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Environment::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// A pair of values keyed by environment, e.g. rpc urls or fee wallet keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerEnvironment<T> {
    pub testnet: T,
    pub mainnet: T,
}

impl<T> PerEnvironment<T> {
    pub fn get(&self, environment: Environment) -> &T {
        match environment {
            Environment::Testnet => &self.testnet,
            Environment::Mainnet => &self.mainnet,
        }
    }
}

/// Everything chain-specific the deployment workflow needs. One profile per
/// supported chain is built from the settings at startup; the workflow itself
/// is chain-agnostic.
#[derive(Debug, Clone)]
pub struct ChainProfile {
    pub chain: Chain,
    pub rpc: PerEnvironment<Url>,
    pub fee_wallet_keys: PerEnvironment<String>,
    pub explorer_base_url: Url,
}

impl ChainProfile {
    pub fn explorer_url(&self, address: &str) -> String {
        format!("{}{}", self.explorer_base_url, address)
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("failed to connect to {url}: {source}")]
    Connection {
        url: Url,
        #[source]
        source: anyhow::Error,
    },
}

/// Accepts keys both with and without the standard hex prefix.
pub fn normalize_private_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("0x") {
        key.to_string()
    } else {
        format!("0x{key}")
    }
}

/// Binds the given key to the rpc endpoint. The chain id is fetched from the
/// node, so an unreachable endpoint surfaces here instead of on the first
/// transaction.
pub async fn connect(rpc_url: &Url, private_key: &str) -> Result<Arc<EthClient>, ConnectError> {
    let provider =
        Provider::<Http>::try_from(rpc_url.as_str()).map_err(|err| ConnectError::Connection {
            url: rpc_url.clone(),
            source: anyhow::Error::new(err),
        })?;
    let wallet: LocalWallet = normalize_private_key(private_key)
        .parse()
        .map_err(|err: WalletError| ConnectError::InvalidPrivateKey(err.to_string()))?;
    let client = SignerMiddleware::new_with_provider_chain(provider, wallet)
        .await
        .map_err(|err| ConnectError::Connection {
            url: rpc_url.clone(),
            source: anyhow::Error::new(err),
        })?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn private_key_prefix_is_normalized() {
        assert_eq!(normalize_private_key("0xabc123"), "0xabc123");
        assert_eq!(normalize_private_key("abc123"), "0xabc123");
        assert_eq!(normalize_private_key("  abc123 "), "0xabc123");
    }

    #[test]
    fn environment_from_numeric_flag() {
        assert_eq!(Environment::try_from(0).unwrap(), Environment::Testnet);
        assert_eq!(Environment::try_from(1).unwrap(), Environment::Mainnet);
        assert!(Environment::try_from(2).is_err());
    }

    #[test]
    fn per_environment_selection() {
        let values = PerEnvironment {
            testnet: "a",
            mainnet: "b",
        };
        assert_eq!(*values.get(Environment::Testnet), "a");
        assert_eq!(*values.get(Environment::Mainnet), "b");
    }

    #[test]
    fn explorer_url_appends_address() {
        let profile = ChainProfile {
            chain: Chain::Ethereum,
            rpc: PerEnvironment {
                testnet: "http://localhost:8545".parse().unwrap(),
                mainnet: "http://localhost:8545".parse().unwrap(),
            },
            fee_wallet_keys: PerEnvironment::default(),
            explorer_base_url: "https://etherscan.io/address/".parse().unwrap(),
        };
        assert_eq!(
            profile.explorer_url("0xcafe"),
            "https://etherscan.io/address/0xcafe"
        );
    }
}

use anyhow::anyhow;
use config::{Config, File};
use contract_deployer::{consts, Chain, ChainProfile, PerEnvironment, SolcConfig};
use serde::{de::IgnoredAny, Deserialize};
use std::{net::SocketAddr, path::PathBuf, str::FromStr};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: ServerSettings,
    pub solc: SolcSettings,
    pub ethereum: ChainSettings,
    pub bnb: ChainSettings,
    pub celo: ChainSettings,
    pub wallet: WalletSettings,
    pub metrics: MetricsSettings,
    pub jaeger: JaegerSettings,

    // Is required as we deny unknown fields, but allow users provide
    // path to config through PREFIX__CONFIG env variable. If removed,
    // the setup would fail with `unknown field `config`, expected one of...`
    #[serde(rename = "config")]
    pub config_path: IgnoredAny,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: Default::default(),
            solc: Default::default(),
            ethereum: ChainSettings::ethereum(),
            bnb: ChainSettings::bnb(),
            celo: ChainSettings::celo(),
            wallet: Default::default(),
            metrics: Default::default(),
            jaeger: Default::default(),
            config_path: Default::default(),
        }
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.server == other.server
            && self.solc == other.solc
            && self.ethereum == other.ethereum
            && self.bnb == other.bnb
            && self.celo == other.celo
            && self.wallet == other.wallet
            && self.metrics == other.metrics
            && self.jaeger == other.jaeger
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from_str("0.0.0.0:3001").expect("should be valid url"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolcSettings {
    pub solc_path: Option<PathBuf>,
    pub solc_version: Option<String>,
}

impl From<SolcSettings> for SolcConfig {
    fn from(settings: SolcSettings) -> Self {
        Self {
            solc_path: settings.solc_path,
            solc_version: settings.solc_version,
        }
    }
}

/// A chain section in the config must spell out its rpc endpoints and
/// explorer url; only the enabled flag and fee keys have defaults. Chains
/// with no section at all fall back to the built-in per-chain defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub rpc: PerEnvironment<Url>,
    #[serde(default)]
    pub fee_wallet_key: PerEnvironment<String>,
    pub explorer_url: Url,
}

fn default_enabled() -> bool {
    true
}

impl ChainSettings {
    fn new(testnet_rpc: &str, mainnet_rpc: &str, explorer_url: &str) -> Self {
        Self {
            enabled: true,
            rpc: PerEnvironment {
                testnet: Url::try_from(testnet_rpc).expect("valid url"),
                mainnet: Url::try_from(mainnet_rpc).expect("valid url"),
            },
            fee_wallet_key: Default::default(),
            explorer_url: Url::try_from(explorer_url).expect("valid url"),
        }
    }

    pub fn ethereum() -> Self {
        Self::new(
            consts::DEFAULT_ETH_TESTNET_RPC,
            consts::DEFAULT_ETH_MAINNET_RPC,
            consts::DEFAULT_ETHERSCAN_BASE_URL,
        )
    }

    pub fn bnb() -> Self {
        Self::new(
            consts::DEFAULT_BNB_TESTNET_RPC,
            consts::DEFAULT_BNB_MAINNET_RPC,
            consts::DEFAULT_BSCSCAN_BASE_URL,
        )
    }

    pub fn celo() -> Self {
        Self::new(
            consts::DEFAULT_CELO_TESTNET_RPC,
            consts::DEFAULT_CELO_MAINNET_RPC,
            consts::DEFAULT_CELOSCAN_BASE_URL,
        )
    }

    pub fn profile(&self, chain: Chain) -> ChainProfile {
        ChainProfile {
            chain,
            rpc: self.rpc.clone(),
            fee_wallet_keys: self.fee_wallet_key.clone(),
            explorer_base_url: self.explorer_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletSettings {
    pub enabled: bool,
    pub networks_config: PathBuf,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            networks_config: PathBuf::from("config/networks.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub addr: SocketAddr,
    pub route: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from_str("0.0.0.0:6060").expect("should be valid url"),
            route: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JaegerSettings {
    pub enabled: bool,
    pub agent_endpoint: String,
}

impl Default for JaegerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            agent_endpoint: "localhost:6831".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let config_path = std::env::var("CONTRACT_DEPLOYER__CONFIG");

        let mut builder = Config::builder();
        if let Ok(config_path) = config_path {
            builder = builder.add_source(File::with_name(&config_path));
        };
        // Use `__` so that it would be possible to address keys with underscores in names (e.g. `fee_wallet_key`)
        builder =
            builder.add_source(config::Environment::with_prefix("CONTRACT_DEPLOYER").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    pub fn enabled_chains(&self) -> Vec<(Chain, &ChainSettings)> {
        [
            (Chain::Ethereum, &self.ethereum),
            (Chain::Bnb, &self.bnb),
            (Chain::Celo, &self.celo),
        ]
        .into_iter()
        .filter(|(_, settings)| settings.enabled)
        .collect()
    }

    fn validate(&self) -> anyhow::Result<()> {
        // An enabled chain without a fee wallet key would fail on the first
        // deployment instead of at startup.
        for (chain, settings) in self.enabled_chains() {
            if settings.fee_wallet_key.testnet.is_empty()
                && settings.fee_wallet_key.mainnet.is_empty()
            {
                return Err(anyhow!(
                    "chain `{}` is enabled but has no fee wallet key for either environment",
                    chain.route_name()
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings_use_per_chain_urls() {
        let settings = Settings::default();
        assert_eq!(
            settings.ethereum.explorer_url.as_str(),
            "https://etherscan.io/address/"
        );
        assert_eq!(
            settings.bnb.explorer_url.as_str(),
            "https://testnet.bscscan.com/address/"
        );
        assert_eq!(
            settings.celo.explorer_url.as_str(),
            "https://celoscan.io/address/"
        );
        assert_ne!(settings.ethereum.rpc, settings.celo.rpc);
    }

    #[test]
    fn chain_section_requires_rpc_and_explorer() {
        assert!(
            serde_json::from_value::<ChainSettings>(serde_json::json!({ "enabled": true })).is_err()
        );

        let settings: ChainSettings = serde_json::from_value(serde_json::json!({
            "rpc": {
                "testnet": "http://localhost:8545",
                "mainnet": "http://localhost:8546",
            },
            "explorer_url": "https://example.com/address/",
        }))
        .expect("valid section");
        assert!(settings.enabled);
        assert!(settings.fee_wallet_key.testnet.is_empty());
    }

    #[test]
    fn enabled_chain_without_fee_key_fails_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.ethereum.fee_wallet_key.testnet = "0x01".to_string();
        settings.bnb.enabled = false;
        settings.celo.enabled = false;
        assert!(settings.validate().is_ok());
    }
}

pub const DEFAULT_ETH_TESTNET_RPC: &str = "https://rpc.sepolia.org";
pub const DEFAULT_ETH_MAINNET_RPC: &str = "https://eth.llamarpc.com";

pub const DEFAULT_BNB_TESTNET_RPC: &str = "https://data-seed-prebsc-1-s1.binance.org:8545";
pub const DEFAULT_BNB_MAINNET_RPC: &str = "https://bsc-dataseed.binance.org";

pub const DEFAULT_CELO_TESTNET_RPC: &str = "https://alfajores-forno.celo-testnet.org";
pub const DEFAULT_CELO_MAINNET_RPC: &str = "https://forno.celo.org";

pub const DEFAULT_ETHERSCAN_BASE_URL: &str = "https://etherscan.io/address/";
pub const DEFAULT_BSCSCAN_BASE_URL: &str = "https://testnet.bscscan.com/address/";
pub const DEFAULT_CELOSCAN_BASE_URL: &str = "https://celoscan.io/address/";

pub mod account;
pub mod chain;
pub mod compiler;
pub mod consts;
pub mod deploy;
pub mod fees;

pub use account::{AccountService, NetworksConfig, TransferKind, TransferOutcome};
pub use chain::{Chain, ChainProfile, Environment, PerEnvironment};
pub use compiler::{SolcConfig, SourceFile};
pub use deploy::{ContractDeployer, DeployError, DeploymentRequest, DeploymentResult};
pub use fees::DeploymentQuote;

use crate::{
    chain::{self, ChainProfile, ConnectError, Environment, EthClient},
    compiler::{self, CompileError, CompiledContract, SourceFile},
    fees::{self, DeploymentQuote, EstimateError},
};
use anyhow::anyhow;
use ethers_contract::{builders::Deployer, ContractFactory};
use ethers_core::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi, Token,
    },
    types::{Address, TransactionRequest},
    utils::to_checksum,
};
use ethers_providers::Middleware;
use ethers_signers::{LocalWallet, Signer, WalletError};
use ethers_solc::Solc;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub environment: Environment,
    /// Contract to deploy out of `index.sol`. Required only when the file
    /// declares more than one contract.
    pub contract_title: Option<String>,
    pub files: Vec<SourceFile>,
    pub constructor_args: Vec<Value>,
    pub user_private_key: String,
}

#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub contract_address: String,
    pub explorer_url: String,
    pub abi: Value,
    pub quote: DeploymentQuote,
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("1 or more important files seem to be missing from this request. Kindly check and revert.")]
    MissingFiles,
    #[error("1 or more important files seem to be missing from this request. Kindly check and revert.")]
    MissingEntryFile,
    #[error("User private key is required for signing the contract.")]
    MissingPrivateKey,
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid constructor arguments: {0}")]
    InvalidConstructorArgs(String),
    #[error("{0}")]
    ContractSelection(String),
    #[error("Compilation error: {0:?}")]
    Compilation(Vec<String>),
    #[error("insufficient balance: {} required, {} available",
        fees::format_native(.0.total_cost), fees::format_native(.0.user_balance))]
    InsufficientBalance(DeploymentQuote),
    #[error("failed to reach the rpc endpoint: {0}")]
    Connection(anyhow::Error),
    #[error("failed to deploy the contract: {0}")]
    Deployment(anyhow::Error),
    #[error("contract deployed at {contract_address}, but the fee transfer failed: {source}")]
    FeeSettlement {
        contract_address: String,
        source: anyhow::Error,
    },
    #[error("{0}")]
    Internal(anyhow::Error),
}

impl From<CompileError> for DeployError {
    fn from(error: CompileError) -> Self {
        match error {
            CompileError::MissingEntryFile => DeployError::MissingEntryFile,
            CompileError::Compilation(details) => DeployError::Compilation(details),
            err @ (CompileError::ContractNotFound(_) | CompileError::AmbiguousContract(_)) => {
                DeployError::ContractSelection(err.to_string())
            }
            CompileError::Solc(err) => DeployError::Internal(anyhow!(err)),
        }
    }
}

impl From<ConnectError> for DeployError {
    fn from(error: ConnectError) -> Self {
        match error {
            ConnectError::InvalidPrivateKey(message) => DeployError::InvalidPrivateKey(message),
            err @ ConnectError::Connection { .. } => DeployError::Connection(anyhow!(err)),
        }
    }
}

impl From<EstimateError> for DeployError {
    fn from(error: EstimateError) -> Self {
        match error {
            EstimateError::Overflow => DeployError::Internal(anyhow!(error)),
            EstimateError::Provider(err) => DeployError::Deployment(err),
        }
    }
}

/// Runs the deployment workflow for one chain:
/// validate -> compile -> connect -> quote -> authorize -> deploy -> settle fee.
///
/// Holds only immutable configuration; one instance per enabled chain is
/// built at startup and shared across requests.
pub struct ContractDeployer {
    profile: ChainProfile,
    solc: Solc,
}

struct Prepared {
    client: Arc<EthClient>,
    deployer: Deployer<Arc<EthClient>, EthClient>,
    quote: DeploymentQuote,
    fee_wallet: Address,
    contract: CompiledContract,
}

impl ContractDeployer {
    pub fn new(profile: ChainProfile, solc: Solc) -> Self {
        Self { profile, solc }
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    /// Price check only: everything up to and including the balance gate,
    /// with zero on-chain writes.
    pub async fn quote(&self, request: &DeploymentRequest) -> Result<DeploymentQuote, DeployError> {
        let prepared = self.prepare(request).await?;
        authorize(&prepared.quote)?;
        Ok(prepared.quote)
    }

    #[instrument(skip_all, fields(chain = %self.profile.chain))]
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        let Prepared {
            client,
            mut deployer,
            quote,
            fee_wallet,
            contract,
        } = self.prepare(request).await?;
        authorize(&quote)?;

        // Pin the quoted values so the submitted transaction cannot cost
        // more than what the balance gate approved.
        deployer.tx.set_gas(quote.gas_units);
        deployer.tx.set_gas_price(quote.gas_price);

        let instance = deployer
            .send()
            .await
            .map_err(|err| DeployError::Deployment(anyhow!(err)))?;
        let contract_address = to_checksum(&instance.address(), None);
        tracing::info!(
            chain = %self.profile.chain,
            contract = contract.name,
            address = contract_address,
            "contract deployed"
        );

        // The deployment is live at this point; a failed fee transfer is
        // surfaced but cannot be rolled back.
        if let Err(source) = settle_fee(&client, fee_wallet, &quote).await {
            return Err(DeployError::FeeSettlement {
                contract_address,
                source,
            });
        }

        Ok(DeploymentResult {
            explorer_url: self.profile.explorer_url(&contract_address),
            contract_address,
            abi: contract.abi_json,
            quote,
        })
    }

    async fn prepare(&self, request: &DeploymentRequest) -> Result<Prepared, DeployError> {
        validate_constructor_args(&request.constructor_args)?;
        if request.files.is_empty() {
            return Err(DeployError::MissingFiles);
        }
        if request.user_private_key.trim().is_empty() {
            return Err(DeployError::MissingPrivateKey);
        }

        let output = compiler::compile(&self.solc, &request.files)?;
        let contract = compiler::select_contract(&output, request.contract_title.as_deref())?;

        let rpc_url = self.profile.rpc.get(request.environment);
        let client = chain::connect(rpc_url, &request.user_private_key).await?;

        // Resolved before any on-chain write, so a misconfigured fee wallet
        // key cannot fail the workflow after the contract is live.
        let fee_wallet = fee_wallet_address(self.profile.fee_wallet_keys.get(request.environment))?;

        let tokens = tokenize_args(&contract.abi, &request.constructor_args)?;
        let factory =
            ContractFactory::new(contract.abi.clone(), contract.bytecode.clone(), client.clone());
        let mut deployer = factory
            .deploy_tokens(tokens)
            .map_err(|err| DeployError::InvalidConstructorArgs(err.to_string()))?;
        deployer.tx.set_from(client.address());

        let quote = fees::estimate(&client, &deployer.tx, client.address()).await?;

        Ok(Prepared {
            client,
            deployer,
            quote,
            fee_wallet,
            contract,
        })
    }
}

fn authorize(quote: &DeploymentQuote) -> Result<(), DeployError> {
    if !quote.covers_total_cost() {
        return Err(DeployError::InsufficientBalance(quote.clone()));
    }
    Ok(())
}

/// Second, separate transaction: exactly the quoted surcharge from the
/// depositor's wallet to the chain's fee wallet.
async fn settle_fee(
    client: &Arc<EthClient>,
    fee_wallet: Address,
    quote: &DeploymentQuote,
) -> Result<(), anyhow::Error> {
    let tx = TransactionRequest::new()
        .to(fee_wallet)
        .value(quote.transaction_fee);
    let pending = client.send_transaction(tx, None).await?;
    pending
        .await?
        .ok_or_else(|| anyhow!("fee transfer dropped from the mempool"))?;
    Ok(())
}

fn fee_wallet_address(key: &str) -> Result<Address, DeployError> {
    if key.trim().is_empty() {
        return Err(DeployError::Internal(anyhow!(
            "fee wallet key is not configured for this environment"
        )));
    }
    let wallet: LocalWallet = chain::normalize_private_key(key)
        .parse()
        .map_err(|err: WalletError| {
            DeployError::Internal(anyhow!("invalid fee wallet key: {err}"))
        })?;
    Ok(wallet.address())
}

/// Constructor arguments are accepted as strings or numbers only, checked
/// before compilation is attempted.
pub fn validate_constructor_args(args: &[Value]) -> Result<(), DeployError> {
    for (index, value) in args.iter().enumerate() {
        if !matches!(value, Value::String(_) | Value::Number(_)) {
            return Err(DeployError::InvalidConstructorArgs(format!(
                "argument {index} must be a string or a number"
            )));
        }
    }
    Ok(())
}

/// Coerces the validated raw arguments against the constructor's parameter
/// types, positionally.
fn tokenize_args(abi: &Abi, args: &[Value]) -> Result<Vec<Token>, DeployError> {
    let params = abi
        .constructor()
        .map(|constructor| constructor.inputs.as_slice())
        .unwrap_or_default();
    if params.len() != args.len() {
        return Err(DeployError::InvalidConstructorArgs(format!(
            "the constructor takes {} argument(s), {} provided",
            params.len(),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, value)| {
            let raw = match value {
                Value::String(string) => string.clone(),
                Value::Number(number) => number.to_string(),
                other => {
                    return Err(DeployError::InvalidConstructorArgs(format!(
                        "argument `{}` must be a string or a number, got {other}",
                        param.name
                    )))
                }
            };
            LenientTokenizer::tokenize(&param.kind, &raw).map_err(|err| {
                DeployError::InvalidConstructorArgs(format!("argument `{}`: {err}", param.name))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn structured_constructor_args_are_rejected() {
        let err = validate_constructor_args(&[json!("owner"), json!({ "nested": true })])
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidConstructorArgs(_)));

        let err = validate_constructor_args(&[json!([1, 2])]).unwrap_err();
        assert!(matches!(err, DeployError::InvalidConstructorArgs(_)));

        validate_constructor_args(&[json!("owner"), json!(42), json!(1.5)])
            .expect("strings and numbers are fine");
        validate_constructor_args(&[]).expect("empty args are fine");
    }

    fn abi_with_constructor() -> Abi {
        serde_json::from_value(json!([
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "supply", "type": "uint256" },
                    { "name": "name", "type": "string" }
                ]
            }
        ]))
        .expect("valid abi")
    }

    #[test]
    fn args_are_tokenized_against_constructor_types() {
        let tokens = tokenize_args(&abi_with_constructor(), &[json!(1000), json!("Coin")])
            .expect("tokenized");
        assert_eq!(
            tokens,
            vec![Token::Uint(1000u64.into()), Token::String("Coin".into())]
        );
    }

    #[test]
    fn arg_count_mismatch_is_rejected() {
        let err = tokenize_args(&abi_with_constructor(), &[json!(1000)]).unwrap_err();
        assert!(matches!(err, DeployError::InvalidConstructorArgs(_)));
    }

    #[test]
    fn args_without_a_constructor_are_rejected() {
        let abi: Abi = serde_json::from_value(json!([])).expect("valid abi");
        let err = tokenize_args(&abi, &[json!(1)]).unwrap_err();
        assert!(matches!(err, DeployError::InvalidConstructorArgs(_)));
        assert!(tokenize_args(&abi, &[]).expect("no args needed").is_empty());
    }

    #[test]
    fn untokenizable_arg_is_rejected() {
        let err =
            tokenize_args(&abi_with_constructor(), &[json!("not-a-number"), json!("Coin")])
                .unwrap_err();
        assert!(matches!(err, DeployError::InvalidConstructorArgs(_)));
    }
}

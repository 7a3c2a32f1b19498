use crate::{
    metrics,
    responses::{DeployResponse, ErrorResponse, QuoteResponse},
};
use actix_web::{web, web::Json, HttpResponse};
use contract_deployer::{
    Chain, ContractDeployer, DeployError, DeploymentRequest, Environment, SourceFile,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployHttpRequest {
    pub environment: u8,
    #[serde(default)]
    pub contract_title: Option<String>,
    #[serde(default)]
    pub solidity_files: Vec<SourceFile>,
    #[serde(default)]
    pub constructor_args: Option<Value>,
    #[serde(default)]
    pub user_private_key: Option<String>,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("environment must be 0 (testnet) or 1 (mainnet)")]
    InvalidEnvironment,
    #[error("Constructor arguments cannot be undefined or null.")]
    MissingConstructorArgs,
}

impl TryFrom<DeployHttpRequest> for DeploymentRequest {
    type Error = ParseError;

    fn try_from(value: DeployHttpRequest) -> Result<Self, Self::Error> {
        let environment = Environment::try_from(value.environment)
            .map_err(|_| ParseError::InvalidEnvironment)?;
        // A bare string or number is treated as a single-argument list.
        let constructor_args = match value.constructor_args {
            None | Some(Value::Null) => return Err(ParseError::MissingConstructorArgs),
            Some(Value::Array(args)) => args,
            Some(single) => vec![single],
        };
        Ok(Self {
            environment,
            contract_title: value.contract_title,
            files: value.solidity_files,
            constructor_args,
            user_private_key: value.user_private_key.unwrap_or_default(),
        })
    }
}

#[instrument(skip(deployer, params), level = "debug")]
pub async fn deploy(
    deployer: web::Data<ContractDeployer>,
    params: Json<DeployHttpRequest>,
) -> HttpResponse {
    let chain = deployer.profile().chain;
    let request: DeploymentRequest = match params.into_inner().try_into() {
        Ok(request) => request,
        Err(err) => {
            metrics::count_deploy_contract(chain.route_name(), "deploy", false);
            return HttpResponse::BadRequest().json(ErrorResponse::new(err));
        }
    };

    let result = deployer.deploy(&request).await;
    metrics::count_deploy_contract(chain.route_name(), "deploy", result.is_ok());
    match result {
        Ok(result) => HttpResponse::Ok().json(DeployResponse::new(chain, result)),
        Err(err) => error_response(chain, err),
    }
}

#[instrument(skip(deployer, params), level = "debug")]
pub async fn quote(
    deployer: web::Data<ContractDeployer>,
    params: Json<DeployHttpRequest>,
) -> HttpResponse {
    let chain = deployer.profile().chain;
    let request: DeploymentRequest = match params.into_inner().try_into() {
        Ok(request) => request,
        Err(err) => {
            metrics::count_deploy_contract(chain.route_name(), "quote", false);
            return HttpResponse::BadRequest().json(ErrorResponse::new(err));
        }
    };

    let result = deployer.quote(&request).await;
    metrics::count_deploy_contract(chain.route_name(), "quote", result.is_ok());
    match result {
        Ok(quote) => HttpResponse::Ok().json(QuoteResponse::from(&quote)),
        Err(err) => error_response(chain, err),
    }
}

fn error_response(chain: Chain, err: DeployError) -> HttpResponse {
    match err {
        DeployError::MissingFiles | DeployError::MissingEntryFile => {
            HttpResponse::NotFound().json(ErrorResponse::new(err))
        }
        DeployError::MissingPrivateKey
        | DeployError::InvalidPrivateKey(_)
        | DeployError::InvalidConstructorArgs(_)
        | DeployError::ContractSelection(_)
        | DeployError::Compilation(_) => HttpResponse::BadRequest().json(ErrorResponse::new(err)),
        DeployError::InsufficientBalance(quote) => {
            HttpResponse::BadRequest().json(ErrorResponse::insufficient_balance(chain, &quote))
        }
        DeployError::FeeSettlement {
            contract_address,
            source,
        } => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Contract deployed, but the transaction fee transfer failed.".to_string(),
            message: Some(source.to_string()),
            contract_address: Some(contract_address),
            ..Default::default()
        }),
        err @ (DeployError::Connection(_) | DeployError::Deployment(_) | DeployError::Internal(_)) => {
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to deploy {chain} contract."),
                message: Some(err.to_string()),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_deploy_request() {
        let input = r#"{
            "environment": 0,
            "contractTitle": "Token",
            "solidityFiles": [
                { "name": "index", "code": "contract Token {}" }
            ],
            "constructorArgs": ["owner", 42],
            "userPrivateKey": "0xabc"
        }"#;

        let deserialized: DeployHttpRequest = serde_json::from_str(input).expect("Valid json");
        let request = DeploymentRequest::try_from(deserialized).expect("valid request");
        assert_eq!(request.environment, Environment::Testnet);
        assert_eq!(request.contract_title.as_deref(), Some("Token"));
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.constructor_args.len(), 2);
        assert_eq!(request.user_private_key, "0xabc");
    }

    #[test]
    fn single_constructor_arg_is_wrapped_into_a_list() {
        let input = r#"{ "environment": 1, "constructorArgs": "owner" }"#;
        let deserialized: DeployHttpRequest = serde_json::from_str(input).expect("Valid json");
        let request = DeploymentRequest::try_from(deserialized).expect("valid request");
        assert_eq!(request.environment, Environment::Mainnet);
        assert_eq!(request.constructor_args, vec![serde_json::json!("owner")]);
        assert!(request.files.is_empty());
        assert!(request.user_private_key.is_empty());
    }

    #[test]
    fn missing_constructor_args_are_rejected() {
        let input = r#"{ "environment": 0 }"#;
        let deserialized: DeployHttpRequest = serde_json::from_str(input).expect("Valid json");
        let err = DeploymentRequest::try_from(deserialized).unwrap_err();
        assert!(matches!(err, ParseError::MissingConstructorArgs));
    }

    #[test]
    fn out_of_range_environment_is_rejected() {
        let input = r#"{ "environment": 2, "constructorArgs": [] }"#;
        let deserialized: DeployHttpRequest = serde_json::from_str(input).expect("Valid json");
        let err = DeploymentRequest::try_from(deserialized).unwrap_err();
        assert!(matches!(err, ParseError::InvalidEnvironment));
    }
}

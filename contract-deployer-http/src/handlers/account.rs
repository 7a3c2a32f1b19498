use crate::responses::{AccountErrorResponse, BalancesResponse, TransferResponse, WalletResponse};
use actix_web::{web, web::Json, HttpResponse};
use contract_deployer::{account::AccountError, AccountService, TransferKind};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn create_wallet(service: web::Data<AccountService>) -> HttpResponse {
    match service.create_wallet() {
        Ok(wallet) => HttpResponse::Ok().json(WalletResponse::from(wallet)),
        Err(err) => {
            tracing::error!(error = %err, "wallet generation failed");
            HttpResponse::InternalServerError()
                .json(AccountErrorResponse::new("Failed to generate wallet."))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceHttpRequest {
    #[serde(default)]
    pub private_key: Option<String>,
}

#[instrument(skip_all)]
pub async fn get_balance(
    service: web::Data<AccountService>,
    params: Json<BalanceHttpRequest>,
) -> HttpResponse {
    let private_key = match params.into_inner().private_key.filter(|key| !key.is_empty()) {
        Some(key) => key,
        None => {
            return HttpResponse::BadRequest()
                .json(AccountErrorResponse::new("Missing required field: privateKey"))
        }
    };

    match service.balances(&private_key).await {
        Ok(balances) => HttpResponse::Ok().json(BalancesResponse::new(balances)),
        Err(err @ AccountError::InvalidPrivateKey(_)) => {
            HttpResponse::BadRequest().json(AccountErrorResponse::new(err))
        }
        Err(err) => {
            tracing::error!(error = %err, "balance lookup failed");
            HttpResponse::InternalServerError()
                .json(AccountErrorResponse::new("Internal server error"))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferHttpRequest {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Display units; accepted as a json string or number.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

const TRANSFER_FIELDS: &str =
    r#"Required fields: privateKey, address, amount, type ("native" or "token")"#;

#[instrument(skip_all)]
pub async fn transfer(
    service: web::Data<AccountService>,
    params: Json<TransferHttpRequest>,
) -> HttpResponse {
    let params = params.into_inner();
    let (private_key, address, kind) = match (
        params.private_key.filter(|key| !key.is_empty()),
        params.address.filter(|address| !address.is_empty()),
        params.kind.filter(|kind| !kind.is_empty()),
    ) {
        (Some(private_key), Some(address), Some(kind)) => (private_key, address, kind),
        _ => return HttpResponse::BadRequest().json(AccountErrorResponse::new(TRANSFER_FIELDS)),
    };
    let amount = match params.amount {
        Some(Value::String(amount)) if !amount.is_empty() => amount,
        Some(Value::Number(amount)) => amount.to_string(),
        _ => return HttpResponse::BadRequest().json(AccountErrorResponse::new(TRANSFER_FIELDS)),
    };
    let kind: TransferKind = match kind.parse() {
        Ok(kind) => kind,
        Err(err) => return HttpResponse::BadRequest().json(AccountErrorResponse::new(err)),
    };

    match service.transfer(&private_key, &address, &amount, kind).await {
        Ok(results) => HttpResponse::Ok().json(TransferResponse::new(results)),
        Err(
            err @ (AccountError::InvalidPrivateKey(_)
            | AccountError::InvalidAddress(_)
            | AccountError::InvalidAmount(_)),
        ) => HttpResponse::BadRequest().json(AccountErrorResponse::new(err)),
        Err(err) => {
            tracing::error!(error = %err, "transfer failed");
            HttpResponse::InternalServerError()
                .json(AccountErrorResponse::new("Internal server error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_transfer_request() {
        let input = r#"{
            "privateKey": "0xabc",
            "address": "0x0000000000000000000000000000000000000001",
            "amount": 1.5,
            "type": "native"
        }"#;
        let deserialized: TransferHttpRequest = serde_json::from_str(input).expect("Valid json");
        assert_eq!(deserialized.private_key.as_deref(), Some("0xabc"));
        assert_eq!(deserialized.kind.as_deref(), Some("native"));
        assert_eq!(deserialized.amount, Some(serde_json::json!(1.5)));
    }

    #[test]
    fn transfer_request_fields_are_optional_at_parse_time() {
        let deserialized: TransferHttpRequest = serde_json::from_str("{}").expect("Valid json");
        assert!(deserialized.private_key.is_none());
        assert!(deserialized.address.is_none());
        assert!(deserialized.amount.is_none());
        assert!(deserialized.kind.is_none());
    }
}

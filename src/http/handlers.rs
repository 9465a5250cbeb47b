//! API route handlers.
//!
//! Bodies are extracted as `Result<Json<T>, JsonRejection>` so malformed JSON
//! is rendered through the same error envelope as everything else, then
//! checked with `Validate` before the gateway sees them.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::config::BuildInfo;
use crate::device::{Features, SignInput, SignOutput};
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::models::{
    CheckMessageSignatureRequest, GenerateAddressesRequest, SignMessageRequest,
    TransactionSignRequest, Validate, ValidationErrors,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub struct CsrfToken {
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct Available {
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct Addresses {
    pub addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Signature {
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct SignerAddress {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct Signatures {
    pub signatures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

fn body<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    value.validate()?;
    Ok(value)
}

/// `GET /api/v1/csrf`
pub async fn csrf(State(state): State<AppState>) -> ApiResult<CsrfToken> {
    let store = state
        .csrf
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("csrf disabled".to_string()))?;
    Ok(ApiResponse::new(CsrfToken {
        csrf_token: store.issue(),
    }))
}

/// `GET /api/v1/version`
pub async fn version(State(state): State<AppState>) -> ApiResult<BuildInfo> {
    Ok(ApiResponse::new(state.config.build.clone()))
}

/// `GET /api/v1/available`
pub async fn available(State(state): State<AppState>) -> ApiResult<Available> {
    let available = state.gateway.available().await;
    Ok(ApiResponse::new(Available { available }))
}

/// `GET /api/v1/features`
pub async fn features(State(state): State<AppState>) -> ApiResult<Features> {
    let features = state.gateway.features().await?;
    Ok(ApiResponse::new(features))
}

/// `POST /api/v1/generate_addresses`
pub async fn generate_addresses(
    State(state): State<AppState>,
    payload: Result<Json<GenerateAddressesRequest>, JsonRejection>,
) -> ApiResult<Addresses> {
    let req = body(payload)?;
    let count = req.address_n.unwrap_or_default();

    let addresses = state
        .gateway
        .generate_addresses(count, req.start_index, req.confirm_address)
        .await?;
    Ok(ApiResponse::new(Addresses { addresses }))
}

/// `POST /api/v1/sign_message`
pub async fn sign_message(
    State(state): State<AppState>,
    payload: Result<Json<SignMessageRequest>, JsonRejection>,
) -> ApiResult<Signature> {
    let req = body(payload)?;
    let address_index = req.address_index.unwrap_or_default();
    let message = req.message.unwrap_or_default();

    let signature = state.gateway.sign_message(address_index, &message).await?;
    Ok(ApiResponse::new(Signature { signature }))
}

/// `POST /api/v1/check_message_signature`
pub async fn check_message_signature(
    State(state): State<AppState>,
    payload: Result<Json<CheckMessageSignatureRequest>, JsonRejection>,
) -> ApiResult<SignerAddress> {
    let req = body(payload)?;
    let address = state
        .gateway
        .check_message_signature(
            req.address.as_deref().unwrap_or_default(),
            req.message.as_deref().unwrap_or_default(),
            req.signature.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ApiResponse::new(SignerAddress { address }))
}

/// `POST /api/v1/transaction_sign`
pub async fn transaction_sign(
    State(state): State<AppState>,
    payload: Result<Json<TransactionSignRequest>, JsonRejection>,
) -> ApiResult<Signatures> {
    let req = body(payload)?;

    let inputs = req
        .transaction_inputs
        .unwrap_or_default()
        .iter()
        .map(SignInput::try_from)
        .collect::<Result<Vec<_>, ValidationErrors>>()?;
    let outputs = req
        .transaction_outputs
        .unwrap_or_default()
        .iter()
        .map(SignOutput::try_from)
        .collect::<Result<Vec<_>, ValidationErrors>>()?;

    tracing::info!(inputs = inputs.len(), outputs = outputs.len(), "Signing transaction");
    let signatures = state.gateway.transaction_sign(inputs, outputs).await?;
    Ok(ApiResponse::new(Signatures { signatures }))
}

/// `PUT /api/v1/cancel`
pub async fn cancel(State(state): State<AppState>) -> ApiResult<Message> {
    state.gateway.cancel().await?;
    Ok(ApiResponse::new(Message {
        message: "operation cancelled",
    }))
}

/// `DELETE /api/v1/wipe`
pub async fn wipe(State(state): State<AppState>) -> ApiResult<Message> {
    tracing::warn!("Wiping device");
    state.gateway.wipe().await?;
    Ok(ApiResponse::new(Message {
        message: "device wiped",
    }))
}

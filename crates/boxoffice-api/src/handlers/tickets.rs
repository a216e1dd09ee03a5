//! Ledger-mutating handlers: /create, /reprice, /transfer, /lock, /delete.

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use boxoffice_core::OperationRequest;

use super::extract::{string_or_number, Payload};
use super::{reject, ApiState};

/// Submit `request` and answer with the committed transaction id.
async fn submit(state: &ApiState, request: OperationRequest) -> Result<String, (StatusCode, String)> {
    let outcome = state.gateway.submit(request).await.map_err(reject)?;
    Ok(outcome.tx_id.into_string())
}

// ── /create (POST) ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTicketRequest {
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub day: String,
    pub seat: String,
}

pub async fn handle_create(
    State(state): State<ApiState>,
    Payload(req): Payload<CreateTicketRequest>,
) -> Result<String, (StatusCode, String)> {
    submit(
        &state,
        OperationRequest::generate_ticket(&req.id, &req.price, &req.day, &req.seat),
    )
    .await
}

// ── /reprice (PUT) ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RepriceRequest {
    pub id: String,
    #[serde(rename = "newPrice", deserialize_with = "string_or_number")]
    pub new_price: String,
}

pub async fn handle_reprice(
    State(state): State<ApiState>,
    Payload(req): Payload<RepriceRequest>,
) -> Result<String, (StatusCode, String)> {
    submit(&state, OperationRequest::reprice_ticket(&req.id, &req.new_price)).await
}

// ── /transfer (PUT) ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TransferRequest {
    pub id: String,
    #[serde(rename = "newOwner")]
    pub new_owner: String,
}

pub async fn handle_transfer(
    State(state): State<ApiState>,
    Payload(req): Payload<TransferRequest>,
) -> Result<String, (StatusCode, String)> {
    submit(&state, OperationRequest::transfer_ticket(&req.id, &req.new_owner)).await
}

// ── /lock (PUT), /delete (POST) ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TicketIdRequest {
    pub id: String,
}

pub async fn handle_lock(
    State(state): State<ApiState>,
    Payload(req): Payload<TicketIdRequest>,
) -> Result<String, (StatusCode, String)> {
    submit(&state, OperationRequest::lock_ticket(&req.id)).await
}

pub async fn handle_delete(
    State(state): State<ApiState>,
    Payload(req): Payload<TicketIdRequest>,
) -> Result<String, (StatusCode, String)> {
    submit(&state, OperationRequest::delete_ticket(&req.id)).await
}

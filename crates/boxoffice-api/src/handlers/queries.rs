//! Read-only handlers. Nothing here is ordered or waits for a commit.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use boxoffice_core::OperationRequest;

use super::{reject, ApiState};

async fn evaluate(
    state: &ApiState,
    request: OperationRequest,
) -> Result<Json<Value>, (StatusCode, String)> {
    state.gateway.evaluate(request).await.map(Json).map_err(reject)
}

// ── /ticketbyowner/{id} ───────────────────────────────────────────────────────

pub async fn handle_ticket_by_owner(
    State(state): State<ApiState>,
    Path(owner): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    evaluate(&state, OperationRequest::query_ticket_by_owner(&owner)).await
}

// ── /ticketHistory/{id} ───────────────────────────────────────────────────────

pub async fn handle_ticket_history(
    State(state): State<ApiState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    evaluate(&state, OperationRequest::ticket_history(&ticket_id)).await
}

// ── /alltickets ───────────────────────────────────────────────────────────────

pub async fn handle_all_tickets(
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, String)> {
    evaluate(&state, OperationRequest::query_all_tickets()).await
}

// ── /ticket/{id} ──────────────────────────────────────────────────────────────

pub async fn handle_ticket(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    evaluate(&state, OperationRequest::query_ticket(&id)).await
}

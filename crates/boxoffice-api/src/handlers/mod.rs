//! HTTP API handlers. Mutations answer with the committed transaction id,
//! queries with the chaincode's JSON.

pub mod extract;
pub mod queries;
pub mod status;
pub mod tickets;

use axum::http::StatusCode;

use boxoffice_ledger::{GatewayError, TicketGateway};

#[derive(Clone)]
pub struct ApiState {
    pub gateway: TicketGateway,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Every workflow failure is a 400 whose body starts with the failure kind.
fn reject(err: GatewayError) -> (StatusCode, String) {
    tracing::warn!(kind = err.kind(), error = %err, "request failed");
    (StatusCode::BAD_REQUEST, format!("{}: {}", err.kind(), err))
}

// Re-export handler functions for use in router setup.
pub use queries::{handle_all_tickets, handle_ticket, handle_ticket_by_owner, handle_ticket_history};
pub use status::handle_version;
pub use tickets::{handle_create, handle_delete, handle_lock, handle_reprice, handle_transfer};

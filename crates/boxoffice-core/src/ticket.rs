//! Ticket records as stored by the ticket chaincode, and the operation
//! requests that drive it.
//!
//! Field names follow the chaincode's JSON so query payloads deserialize
//! straight into these types.

use serde::{Deserialize, Serialize};

use crate::ledger::OperationRequest;

/// Chaincode function names.
pub mod functions {
    pub const GENERATE_TICKET: &str = "generateTicket";
    pub const REPRICE_TICKET: &str = "repriceTicket";
    pub const TRANSFER_TICKET: &str = "transferTicket";
    pub const LOCK_TICKET: &str = "lockTicket";
    pub const DELETE_TICKET: &str = "deleteTicket";
    pub const QUERY_TICKET: &str = "queryTicket";
    pub const QUERY_TICKET_BY_OWNER: &str = "queryTicketByOwner";
    pub const TICKET_HISTORY: &str = "ticketHistory";
    pub const QUERY_ALL_TICKETS: &str = "queryAllTickets";
}

/// `docType` value marking ticket records in world state.
pub const TICKET_DOC_TYPE: &str = "ticket";

/// A ticket for a (possibly multi-day) event.
///
/// Unsold tickets have an empty owner. Locking is irreversible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub price: u64,
    pub owner: String,
    pub day: i32,
    pub seat: String,
    #[serde(default)]
    pub locked: Option<bool>,
}

impl Ticket {
    pub fn new(id: impl Into<String>, price: u64, day: i32, seat: impl Into<String>) -> Self {
        Self {
            doc_type: TICKET_DOC_TYPE.to_string(),
            id: id.into(),
            price,
            owner: String::new(),
            day,
            seat: seat.into(),
            locked: Some(false),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false)
    }

    pub fn is_sold(&self) -> bool {
        !self.owner.is_empty()
    }
}

/// Range and rich-query result row: `{"id": ..., "ticket": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: String,
    pub ticket: Ticket,
}

/// One historic value of a ticket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "TxId")]
    pub tx_id: String,
    /// `null` for the entry that deleted the key.
    #[serde(rename = "Value")]
    pub value: Option<Ticket>,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// "true" / "false", kept as a string to match the chaincode's output.
    #[serde(rename = "IsDelete")]
    pub is_delete: String,
}

// ── Request builders ──────────────────────────────────────────────────────────

impl OperationRequest {
    pub fn generate_ticket(id: &str, price: &str, day: &str, seat: &str) -> Self {
        Self::new(
            functions::GENERATE_TICKET,
            vec![id.to_string(), price.to_string(), day.to_string(), seat.to_string()],
        )
    }

    pub fn reprice_ticket(id: &str, new_price: &str) -> Self {
        Self::new(
            functions::REPRICE_TICKET,
            vec![id.to_string(), new_price.to_string()],
        )
    }

    pub fn transfer_ticket(id: &str, new_owner: &str) -> Self {
        Self::new(
            functions::TRANSFER_TICKET,
            vec![id.to_string(), new_owner.to_string()],
        )
    }

    pub fn lock_ticket(id: &str) -> Self {
        Self::new(functions::LOCK_TICKET, vec![id.to_string()])
    }

    pub fn delete_ticket(id: &str) -> Self {
        Self::new(functions::DELETE_TICKET, vec![id.to_string()])
    }

    pub fn query_ticket(id: &str) -> Self {
        Self::new(functions::QUERY_TICKET, vec![id.to_string()])
    }

    pub fn query_ticket_by_owner(owner: &str) -> Self {
        Self::new(functions::QUERY_TICKET_BY_OWNER, vec![owner.to_string()])
    }

    pub fn ticket_history(id: &str) -> Self {
        Self::new(functions::TICKET_HISTORY, vec![id.to_string()])
    }

    pub fn query_all_tickets() -> Self {
        Self::new(functions::QUERY_ALL_TICKETS, Vec::new())
    }
}

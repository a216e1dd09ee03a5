//! The ticket chaincode, run in-process by simulated peers.

use serde_json::{json, Value};
use thiserror::Error;

use boxoffice_core::ledger::{STATUS_ERROR, STATUS_OK};
use boxoffice_core::ticket::{functions, TICKET_DOC_TYPE};
use boxoffice_core::Ticket;

use super::state::TxSimulator;

/// What a chaincode invocation returns to the endorsing peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeResponse {
    pub status: u32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl ChaincodeResponse {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }
}

pub trait Chaincode: Send + Sync {
    fn invoke(&self, stub: &mut TxSimulator<'_>, function: &str, args: &[String]) -> ChaincodeResponse;
}

#[derive(Debug, Error)]
enum ChaincodeError {
    #[error("Function invocation not found: {0}")]
    UnknownFunction(String),

    #[error("Incorrect number of arguments. Expecting {0}")]
    Arity(&'static str),

    #[error("{0} argument must be a non-empty string")]
    Empty(&'static str),

    #[error("{0} argument must be a numeric string")]
    NotNumeric(&'static str),

    #[error("This ticket already exists: {0}")]
    Exists(String),

    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Can not transfer ownership for a locked ticket")]
    TransferLocked,

    #[error("Can not reprice sold tickets")]
    RepriceSold,

    #[error("Can not reprice locked tickets")]
    RepriceLocked,

    #[error("Can not lock an unsold ticket")]
    LockUnsold,

    #[error("corrupt ticket record {id}: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Query(String),
}

type TicketResult = Result<Vec<u8>, ChaincodeError>;

/// Ticket lifecycle contract.
///
/// Unsold tickets have an empty owner; transfer sells or resells one and
/// lower-cases the new owner. A locked ticket can be neither transferred nor
/// repriced, and only sold tickets can be locked.
#[derive(Debug, Default)]
pub struct TicketContract;

impl Chaincode for TicketContract {
    fn invoke(&self, stub: &mut TxSimulator<'_>, function: &str, args: &[String]) -> ChaincodeResponse {
        let result = match function {
            functions::GENERATE_TICKET => generate(stub, args),
            functions::TRANSFER_TICKET => transfer(stub, args),
            functions::REPRICE_TICKET => reprice(stub, args),
            functions::LOCK_TICKET => lock(stub, args),
            functions::DELETE_TICKET => delete(stub, args),
            functions::QUERY_TICKET => query_one(stub, args),
            functions::QUERY_TICKET_BY_OWNER => by_owner(stub, args),
            functions::QUERY_ALL_TICKETS => all(stub),
            functions::TICKET_HISTORY => history(stub, args),
            other => Err(ChaincodeError::UnknownFunction(other.to_string())),
        };
        match result {
            Ok(payload) => ChaincodeResponse::success(payload),
            Err(e) => {
                tracing::debug!(function, error = %e, "chaincode refused invocation");
                ChaincodeResponse::error(e.to_string())
            }
        }
    }
}

fn non_empty<'a>(args: &'a [String], index: usize, ordinal: &'static str) -> Result<&'a str, ChaincodeError> {
    match args.get(index) {
        Some(arg) if !arg.is_empty() => Ok(arg.as_str()),
        _ => Err(ChaincodeError::Empty(ordinal)),
    }
}

fn load(stub: &mut TxSimulator<'_>, id: &str) -> Result<Ticket, ChaincodeError> {
    let bytes = stub
        .get_state(id)
        .ok_or_else(|| ChaincodeError::NotFound(id.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|source| ChaincodeError::Corrupt {
        id: id.to_string(),
        source,
    })
}

fn store(stub: &mut TxSimulator<'_>, ticket: &Ticket) -> TicketResult {
    let bytes = serde_json::to_vec(ticket).map_err(|source| ChaincodeError::Corrupt {
        id: ticket.id.clone(),
        source,
    })?;
    stub.put_state(&ticket.id, bytes);
    Ok(Vec::new())
}

fn generate(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    if args.len() != 4 {
        return Err(ChaincodeError::Arity("4"));
    }
    let id = non_empty(args, 0, "1st")?;
    let price = non_empty(args, 1, "2nd")?;
    let day = non_empty(args, 2, "3rd")?;
    let seat = non_empty(args, 3, "4th")?;

    let price: u64 = price.parse().map_err(|_| ChaincodeError::NotNumeric("2nd"))?;
    let day: i32 = day.parse().map_err(|_| ChaincodeError::NotNumeric("3rd"))?;

    if stub.get_state(id).is_some() {
        return Err(ChaincodeError::Exists(id.to_string()));
    }
    store(stub, &Ticket::new(id, price, day, seat))
}

fn transfer(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    if args.len() != 2 {
        return Err(ChaincodeError::Arity("2"));
    }
    let id = non_empty(args, 0, "1st")?;
    let new_owner = non_empty(args, 1, "2nd")?.to_lowercase();

    let mut ticket = load(stub, id)?;
    if ticket.is_locked() {
        return Err(ChaincodeError::TransferLocked);
    }
    ticket.owner = new_owner;
    store(stub, &ticket)
}

fn reprice(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    if args.len() != 2 {
        return Err(ChaincodeError::Arity("the id, new price."));
    }
    let id = non_empty(args, 0, "1st")?;
    let new_price: u64 = args[1].parse().map_err(|_| ChaincodeError::NotNumeric("2nd"))?;

    let mut ticket = load(stub, id)?;
    if ticket.is_sold() {
        return Err(ChaincodeError::RepriceSold);
    }
    if ticket.is_locked() {
        return Err(ChaincodeError::RepriceLocked);
    }
    ticket.price = new_price;
    store(stub, &ticket)
}

fn lock(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    let id = args.first().ok_or(ChaincodeError::Arity("1."))?;
    let mut ticket = load(stub, id)?;
    if !ticket.is_sold() {
        return Err(ChaincodeError::LockUnsold);
    }
    ticket.locked = Some(true);
    store(stub, &ticket)
}

fn delete(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    if args.len() != 1 {
        return Err(ChaincodeError::Arity("the id."));
    }
    let id = &args[0];
    if stub.get_state(id).is_none() {
        return Err(ChaincodeError::NotFound(id.clone()));
    }
    stub.del_state(id);
    Ok(Vec::new())
}

fn query_one(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    if args.len() != 1 {
        return Err(ChaincodeError::Arity("the id of the ticket to query."));
    }
    stub.get_state(&args[0])
        .ok_or_else(|| ChaincodeError::NotFound(args[0].clone()))
}

fn by_owner(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    let owner = args.first().ok_or(ChaincodeError::Arity("1."))?;
    let query = json!({ "selector": { "docType": TICKET_DOC_TYPE, "owner": owner } });
    let rows = stub
        .get_query_result(&query.to_string())
        .map_err(ChaincodeError::Query)?;
    Ok(records(rows))
}

fn all(stub: &mut TxSimulator<'_>) -> TicketResult {
    let rows = stub.get_state_by_range("", "");
    Ok(records(rows))
}

/// `[{"id": key, "ticket": value}, ...]`. Values that are not JSON are
/// carried as strings.
fn records(rows: Vec<(String, Vec<u8>)>) -> Vec<u8> {
    let list: Vec<Value> = rows
        .into_iter()
        .map(|(id, bytes)| {
            let ticket = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            json!({ "id": id, "ticket": ticket })
        })
        .collect();
    Value::Array(list).to_string().into_bytes()
}

fn history(stub: &mut TxSimulator<'_>, args: &[String]) -> TicketResult {
    let id = args.first().ok_or(ChaincodeError::Arity("1"))?;
    let entries: Vec<Value> = stub
        .get_history_for_key(id)
        .into_iter()
        .map(|m| {
            let value = m
                .value
                .as_deref()
                .and_then(|bytes| serde_json::from_slice(bytes).ok())
                .unwrap_or(Value::Null);
            json!({
                "TxId": m.tx_id,
                "Value": value,
                "Timestamp": m.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "IsDelete": m.is_delete.to_string(),
            })
        })
        .collect();
    Ok(Value::Array(entries).to_string().into_bytes())
}

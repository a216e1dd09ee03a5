//! boxoffice-core: configuration, identifiers, ledger wire types and the
//! ticket record model. All other Box Office crates depend on this one.

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod ticket;

pub use ledger::{
    CommitEvent, CommitOutcome, Endorsement, OperationRequest, ProposalResponse, SubmissionAck,
    TxId, ValidationCode,
};
pub use ticket::{HistoryEntry, Ticket, TicketRecord};

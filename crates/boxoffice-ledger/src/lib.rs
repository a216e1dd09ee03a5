//! boxoffice-ledger: the transaction submission and query workflows.
//!
//! `TicketGateway::submit` runs propose → endorse check → order → wait for the
//! commit event; `TicketGateway::evaluate` runs a single-peer query. Both go
//! through a `LedgerPlatform`; `sim::SimulatedNetwork` is the in-process one.

pub mod commit;
pub mod error;
pub mod gateway;
pub mod platform;
pub mod proposal;
pub mod query;
pub mod session;
pub mod sim;
pub mod wallet;

pub use error::GatewayError;
pub use gateway::TicketGateway;
pub use platform::{
    Channel, CommitSubscription, Creator, EndorsedTransaction, EventHubConnection, LedgerPlatform,
    Proposal,
};
pub use session::NetworkSession;
pub use wallet::{CredentialStore, Identity, UserContext};

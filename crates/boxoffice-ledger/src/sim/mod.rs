//! In-process ledger network used by `boxofficed --simulate`, the API tests
//! and the integration suite.

pub mod chaincode;
pub mod network;
pub mod state;

pub use chaincode::{Chaincode, ChaincodeResponse, TicketContract};
pub use network::{NetworkStats, SimulatedNetwork, SimulationFaults};

//! CLI command modules.

pub mod http;
pub mod queries;
pub mod tickets;

//! Failure taxonomy of the submission and query workflows.
//!
//! Every variant is terminal for the current request. Nothing is retried and
//! nothing is persisted locally; the ledger decides what committed.

use std::path::PathBuf;
use std::time::Duration;

use boxoffice_core::{TxId, ValidationCode};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("identity {user:?} is not usable: {reason}")]
    Identity { user: String, reason: String },

    #[error("credential store {} unavailable: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("proposal rejected: {0}")]
    ProposalRejected(String),

    #[error("failed to order transaction {tx_id}: status {status}{}", info_suffix(.info))]
    OrderingRejected {
        tx_id: TxId,
        status: String,
        info: String,
    },

    #[error("no commit event for transaction {tx_id} within {}s", timeout.as_secs_f64())]
    CommitTimeout { tx_id: TxId, timeout: Duration },

    #[error("transaction {tx_id} was invalid, code = {code}")]
    InvalidTransaction { tx_id: TxId, code: ValidationCode },

    #[error("event hub: {0}")]
    EventHub(String),

    #[error("query failed: {0}")]
    Query(String),
}

fn info_suffix(info: &str) -> String {
    if info.is_empty() {
        String::new()
    } else {
        format!(" ({info})")
    }
}

impl GatewayError {
    pub(crate) fn identity(user: &str, reason: impl Into<String>) -> Self {
        Self::Identity {
            user: user.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }

    /// Name of the failure kind as reported to HTTP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Identity { .. } => "IdentityError",
            Self::Store { .. } => "StoreError",
            Self::ProposalRejected(_) => "ProposalRejected",
            Self::OrderingRejected { .. } => "OrderingRejected",
            Self::CommitTimeout { .. } => "CommitTimeout",
            Self::InvalidTransaction { .. } => "InvalidTransaction",
            Self::EventHub(_) => "EventHubError",
            Self::Query(_) => "QueryError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_platform_detail() {
        let err = GatewayError::InvalidTransaction {
            tx_id: TxId::from("ab12".to_string()),
            code: ValidationCode::MvccReadConflict,
        };
        assert_eq!(err.kind(), "InvalidTransaction");
        assert_eq!(
            err.to_string(),
            "transaction ab12 was invalid, code = MVCC_READ_CONFLICT"
        );

        let err = GatewayError::OrderingRejected {
            tx_id: TxId::from("ab12".to_string()),
            status: "SERVICE_UNAVAILABLE".to_string(),
            info: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "failed to order transaction ab12: status SERVICE_UNAVAILABLE"
        );

        let err = GatewayError::CommitTimeout {
            tx_id: TxId::from("ab12".to_string()),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.kind(), "CommitTimeout");
        assert!(err.to_string().contains("within 1.5s"));
    }
}

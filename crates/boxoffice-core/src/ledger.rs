//! Ledger wire types exchanged between the gateway and the ledger platform.
//!
//! These mirror what an endorsing peer, the ordering service and a peer's
//! event hub hand back. Nothing here talks to the network.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto;

/// Status an endorsing peer returns when chaincode simulation succeeded.
pub const STATUS_OK: u32 = 200;

/// Status a peer returns when chaincode simulation failed.
pub const STATUS_ERROR: u32 = 500;

// ── Transaction id ────────────────────────────────────────────────────────────

/// Opaque transaction identifier, hex encoded.
///
/// Minted once per operation attempt; used to submit the transaction and to
/// correlate the commit event that confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Mint a transaction id for `creator` from a fresh nonce.
    pub fn mint(creator: &[u8; 32]) -> (Self, [u8; crypto::NONCE_LEN]) {
        let nonce = crypto::generate_nonce();
        let id = crypto::transaction_id(&nonce, creator);
        (Self(hex::encode(id)), nonce)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// First 16 hex chars, for log lines. Ids that are not plain hex are
    /// returned whole when 16 bytes would split a character.
    pub fn short(&self) -> &str {
        self.0.get(..16).unwrap_or(&self.0)
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Operation request ─────────────────────────────────────────────────────────

/// A chaincode function name plus its ordered string arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub function: String,
    pub args: Vec<String>,
}

impl OperationRequest {
    pub fn new(function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }
}

// ── Endorsement ───────────────────────────────────────────────────────────────

/// A peer's signature over its simulation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endorsement {
    /// Name of the endorsing peer.
    pub endorser: String,
    pub signature: Vec<u8>,
}

/// One peer's answer to a transaction proposal.
#[derive(Debug, Clone)]
pub struct ProposalResponse {
    pub peer: String,
    pub status: u32,
    pub message: String,
    /// Chaincode return value. Empty for most mutations.
    pub payload: Bytes,
    /// Serialized simulation results (read/write set). Opaque to the gateway;
    /// the ordering service carries it to the committing peers.
    pub results: Bytes,
    /// Absent when the peer refused to endorse.
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    /// Status 200 with a non-empty endorsement signature.
    pub fn is_endorsed(&self) -> bool {
        self.status == STATUS_OK
            && self
                .endorsement
                .as_ref()
                .is_some_and(|e| !e.signature.is_empty())
    }
}

// ── Ordering ──────────────────────────────────────────────────────────────────

/// Ordering service answer to a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub status: String,
    #[serde(default)]
    pub info: String,
}

impl SubmissionAck {
    pub const SUCCESS: &'static str = "SUCCESS";

    pub fn success() -> Self {
        Self {
            status: Self::SUCCESS.to_string(),
            info: String::new(),
        }
    }

    pub fn rejected(status: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            info: info.into(),
        }
    }

    pub fn accepted(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

// ── Commit ────────────────────────────────────────────────────────────────────

/// Validation code a peer assigns to a transaction at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    Valid,
    MvccReadConflict,
    EndorsementPolicyFailure,
    DuplicateTxId,
    BadPayload,
    Other(String),
}

impl ValidationCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Valid => "VALID",
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::DuplicateTxId => "DUPLICATE_TXID",
            Self::BadPayload => "BAD_PAYLOAD",
            Self::Other(code) => code,
        }
    }

    pub fn parse(code: &str) -> Self {
        match code {
            "VALID" => Self::Valid,
            "MVCC_READ_CONFLICT" => Self::MvccReadConflict,
            "ENDORSEMENT_POLICY_FAILURE" => Self::EndorsementPolicyFailure,
            "DUPLICATE_TXID" => Self::DuplicateTxId,
            "BAD_PAYLOAD" => Self::BadPayload,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValidationCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValidationCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

/// Event hub notification that a transaction reached a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub tx_id: TxId,
    pub code: ValidationCode,
    pub block_number: u64,
    /// Peer whose event hub delivered the notification.
    pub peer: String,
}

/// Final outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub tx_id: TxId,
    pub code: ValidationCode,
    pub block_number: u64,
    pub peer: String,
}

impl CommitOutcome {
    pub fn committed(&self) -> bool {
        self.code.is_valid()
    }
}

impl From<CommitEvent> for CommitOutcome {
    fn from(event: CommitEvent) -> Self {
        Self {
            tx_id: event.tx_id,
            code: event.code,
            block_number: event.block_number,
            peer: event.peer,
        }
    }
}

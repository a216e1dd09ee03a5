//! The seam between the gateway workflows and a ledger network.
//!
//! `LedgerPlatform` is everything the gateway needs from peers, the ordering
//! service and a peer's event hub. The workflows in `proposal`, `commit` and
//! `query` only ever talk to the network through this trait.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::oneshot;

use boxoffice_core::crypto::{self, NONCE_LEN};
use boxoffice_core::{CommitEvent, OperationRequest, ProposalResponse, SubmissionAck, TxId};

// ── Channel ───────────────────────────────────────────────────────────────────

/// A named channel with its attached peers and ordering service.
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    chaincode_id: String,
    peers: Vec<String>,
    orderer: Option<String>,
}

impl Channel {
    pub fn new(id: impl Into<String>, chaincode_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chaincode_id: chaincode_id.into(),
            peers: Vec::new(),
            orderer: None,
        }
    }

    pub fn add_peer(&mut self, addr: impl Into<String>) {
        let addr = addr.into();
        if !self.peers.contains(&addr) {
            self.peers.push(addr);
        }
    }

    /// Replaces any previously attached orderer.
    pub fn add_orderer(&mut self, addr: impl Into<String>) {
        self.orderer = Some(addr.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chaincode_id(&self) -> &str {
        &self.chaincode_id
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn orderer(&self) -> Option<&str> {
        self.orderer.as_deref()
    }
}

// ── Proposal ──────────────────────────────────────────────────────────────────

/// Who signed a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub name: String,
    pub msp_id: String,
    pub public_key: [u8; 32],
}

/// A transaction proposal, signed-for by its creator.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub tx_id: TxId,
    pub nonce: [u8; NONCE_LEN],
    pub channel_id: String,
    pub chaincode_id: String,
    pub request: OperationRequest,
    pub creator: Creator,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl Proposal {
    pub fn new(
        tx_id: TxId,
        nonce: [u8; NONCE_LEN],
        channel: &Channel,
        request: OperationRequest,
        creator: Creator,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            tx_id,
            nonce,
            channel_id: channel.id().to_string(),
            chaincode_id: channel.chaincode_id().to_string(),
            request,
            creator,
            timestamp,
        }
    }

    /// Digest binding the proposal header and its chaincode invocation.
    pub fn digest(&self) -> [u8; 32] {
        let mut h = crypto::Hasher::new();
        h.update_field(self.tx_id.as_str().as_bytes());
        h.update_field(&self.nonce);
        h.update_field(self.channel_id.as_bytes());
        h.update_field(self.chaincode_id.as_bytes());
        h.update_field(self.request.function.as_bytes());
        for arg in &self.request.args {
            h.update_field(arg.as_bytes());
        }
        h.update_field(&self.creator.public_key);
        h.finalize()
    }
}

/// A proposal together with the responses gathered for it.
#[derive(Debug, Clone)]
pub struct EndorsedTransaction {
    pub proposal: Proposal,
    pub responses: Vec<ProposalResponse>,
}

impl EndorsedTransaction {
    pub fn tx_id(&self) -> &TxId {
        &self.proposal.tx_id
    }
}

// ── Commit subscription ───────────────────────────────────────────────────────

/// A live connection to a peer's event hub.
pub trait EventHubConnection: Send {
    fn peer_addr(&self) -> &str;
    fn unregister_tx_event(&mut self, tx_id: &TxId);
    fn disconnect(&mut self);
}

/// Registration for the commit event of one transaction id.
///
/// Teardown (unregister, then disconnect) runs exactly once: either through
/// `close` or, failing that, on drop.
pub struct CommitSubscription {
    tx_id: TxId,
    events: Option<oneshot::Receiver<CommitEvent>>,
    hub: Box<dyn EventHubConnection>,
    closed: bool,
}

impl CommitSubscription {
    pub fn new(
        tx_id: TxId,
        events: oneshot::Receiver<CommitEvent>,
        hub: Box<dyn EventHubConnection>,
    ) -> Self {
        Self {
            tx_id,
            events: Some(events),
            hub,
            closed: false,
        }
    }

    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn peer_addr(&self) -> &str {
        self.hub.peer_addr()
    }

    /// Wait for the commit event. `None` if the hub went away first or the
    /// subscription is already closed.
    pub async fn next_event(&mut self) -> Option<CommitEvent> {
        let events = self.events.as_mut()?;
        let event = events.await.ok();
        self.events = None;
        event
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.events = None;
        self.hub.unregister_tx_event(&self.tx_id);
        self.hub.disconnect();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for CommitSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Platform ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LedgerPlatform: Send + Sync {
    /// Ask every peer attached to `channel` to simulate and endorse.
    async fn send_proposal(
        &self,
        channel: &Channel,
        proposal: &Proposal,
    ) -> anyhow::Result<Vec<ProposalResponse>>;

    /// Broadcast an endorsed transaction to the channel's ordering service.
    async fn send_transaction(
        &self,
        channel: &Channel,
        transaction: EndorsedTransaction,
    ) -> anyhow::Result<SubmissionAck>;

    /// Connect to the event hub at `event_addr` and register for `tx_id`.
    async fn subscribe_commit_event(
        &self,
        event_addr: &str,
        tx_id: &TxId,
    ) -> anyhow::Result<CommitSubscription>;

    /// Evaluate a read-only invocation on a peer. Nothing is ordered.
    async fn query(
        &self,
        channel: &Channel,
        proposal: &Proposal,
    ) -> anyhow::Result<Vec<ProposalResponse>>;
}

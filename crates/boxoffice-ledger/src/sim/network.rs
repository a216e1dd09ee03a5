//! An in-process ledger network: one endorsing peer with its event hub and
//! one ordering service, sharing a single world state.
//!
//! Ordering is asynchronous. `send_transaction` acknowledges immediately and a
//! background task validates and commits the transaction, then publishes the
//! commit event to whoever registered for it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::oneshot;

use boxoffice_core::config::LedgerConfig;
use boxoffice_core::crypto::{Hasher, Keypair};
use boxoffice_core::ledger::{STATUS_ERROR, STATUS_OK};
use boxoffice_core::{
    CommitEvent, Endorsement, ProposalResponse, SubmissionAck, TxId, ValidationCode,
};

use super::chaincode::{Chaincode, ChaincodeResponse, TicketContract};
use super::state::{ReadWriteSet, TxSimulator, WorldState};
use crate::platform::{
    Channel, CommitSubscription, EndorsedTransaction, EventHubConnection, LedgerPlatform, Proposal,
};

/// Failures to inject into the simulated network.
#[derive(Debug, Clone, Default)]
pub struct SimulationFaults {
    /// Peer refuses every proposal with status 500 and this message.
    pub reject_proposals: Option<String>,
    /// Ordering service answers with this status instead of SUCCESS.
    pub ordering_status: Option<String>,
    /// Commit transactions but never publish their events.
    pub drop_commit_events: bool,
    /// Validation code stamped on every committed transaction.
    pub force_validation_code: Option<ValidationCode>,
    /// Delay between ordering and commit.
    pub commit_delay: Duration,
}

/// Call and event hub counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub proposals: u64,
    pub transactions: u64,
    pub queries: u64,
    pub hub_connections: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub disconnects: u64,
    pub events_published: u64,
}

#[derive(Default)]
struct Counters {
    proposals: AtomicU64,
    transactions: AtomicU64,
    queries: AtomicU64,
    hub_connections: AtomicU64,
    registrations: AtomicU64,
    unregistrations: AtomicU64,
    disconnects: AtomicU64,
    events_published: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct Inner {
    peer_addr: String,
    event_addr: String,
    orderer_addr: String,
    chaincode_id: String,
    peer_key: Keypair,
    chaincode: Box<dyn Chaincode>,
    ledger: RwLock<WorldState>,
    registrations: DashMap<TxId, oneshot::Sender<CommitEvent>>,
    faults: Mutex<SimulationFaults>,
    counters: Counters,
}

#[derive(Clone)]
pub struct SimulatedNetwork {
    inner: Arc<Inner>,
}

impl SimulatedNetwork {
    /// A network at the addresses in `ledger`, running the ticket chaincode.
    pub fn new(ledger: &LedgerConfig) -> Self {
        Self::with_chaincode(ledger, Box::new(TicketContract))
    }

    pub fn with_chaincode(ledger: &LedgerConfig, chaincode: Box<dyn Chaincode>) -> Self {
        Self {
            inner: Arc::new(Inner {
                peer_addr: ledger.peer.clone(),
                event_addr: ledger.events.clone(),
                orderer_addr: ledger.orderer.clone(),
                chaincode_id: ledger.chaincode_id.clone(),
                peer_key: Keypair::generate(),
                chaincode,
                ledger: RwLock::new(WorldState::new()),
                registrations: DashMap::new(),
                faults: Mutex::new(SimulationFaults::default()),
                counters: Counters::default(),
            }),
        }
    }

    pub fn set_faults(&self, faults: SimulationFaults) {
        *self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner) = faults;
    }

    pub fn stats(&self) -> NetworkStats {
        let c = &self.inner.counters;
        NetworkStats {
            proposals: c.proposals.load(Ordering::Relaxed),
            transactions: c.transactions.load(Ordering::Relaxed),
            queries: c.queries.load(Ordering::Relaxed),
            hub_connections: c.hub_connections.load(Ordering::Relaxed),
            registrations: c.registrations.load(Ordering::Relaxed),
            unregistrations: c.unregistrations.load(Ordering::Relaxed),
            disconnects: c.disconnects.load(Ordering::Relaxed),
            events_published: c.events_published.load(Ordering::Relaxed),
        }
    }

    /// Event registrations not yet torn down.
    pub fn open_registrations(&self) -> usize {
        self.inner.registrations.len()
    }

    /// Number of blocks committed.
    pub fn height(&self) -> u64 {
        self.inner.read_ledger().height()
    }
}

impl Inner {
    fn faults(&self) -> std::sync::MutexGuard<'_, SimulationFaults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_ledger(&self) -> std::sync::RwLockReadGuard<'_, WorldState> {
        self.ledger.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_ledger(&self) -> std::sync::RwLockWriteGuard<'_, WorldState> {
        self.ledger.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_peer(&self, channel: &Channel) -> anyhow::Result<()> {
        if channel.peers().is_empty() {
            bail!("channel {} has no peers attached", channel.id());
        }
        for addr in channel.peers() {
            if *addr != self.peer_addr {
                bail!("peer {addr} unreachable");
            }
        }
        Ok(())
    }

    /// Run the chaincode against committed state.
    fn simulate(&self, proposal: &Proposal) -> (ChaincodeResponse, ReadWriteSet) {
        if proposal.chaincode_id != self.chaincode_id {
            let message = format!("chaincode {} is not installed", proposal.chaincode_id);
            return (ChaincodeResponse::error(message), ReadWriteSet::default());
        }
        let state = self.read_ledger();
        let mut stub = TxSimulator::new(&state);
        let response = self.chaincode.invoke(
            &mut stub,
            &proposal.request.function,
            &proposal.request.args,
        );
        (response, stub.into_rwset())
    }

    fn endorsement_digest(proposal: &Proposal, payload: &[u8], results: &[u8]) -> [u8; 32] {
        let mut h = Hasher::new();
        h.update_field(&proposal.digest());
        h.update_field(payload);
        h.update_field(results);
        h.finalize()
    }

    fn endorse(&self, proposal: &Proposal) -> ProposalResponse {
        let rejection = self.faults().reject_proposals.clone();
        if let Some(message) = rejection {
            return ProposalResponse {
                peer: self.peer_addr.clone(),
                status: STATUS_ERROR,
                message,
                payload: Bytes::new(),
                results: Bytes::new(),
                endorsement: None,
            };
        }

        let (response, rwset) = self.simulate(proposal);
        let results = rwset.to_bytes();
        let endorsement = (response.status == STATUS_OK).then(|| {
            let digest = Self::endorsement_digest(proposal, &response.payload, &results);
            Endorsement {
                endorser: self.peer_addr.clone(),
                signature: self.peer_key.sign(&digest).to_vec(),
            }
        });
        ProposalResponse {
            peer: self.peer_addr.clone(),
            status: response.status,
            message: response.message,
            payload: Bytes::from(response.payload),
            results: Bytes::from(results),
            endorsement,
        }
    }

    fn endorsement_is_valid(&self, transaction: &EndorsedTransaction) -> bool {
        !transaction.responses.is_empty()
            && transaction.responses.iter().all(|response| {
                let Some(endorsement) = &response.endorsement else {
                    return false;
                };
                let digest = Self::endorsement_digest(
                    &transaction.proposal,
                    &response.payload,
                    &response.results,
                );
                endorsement.endorser == self.peer_addr
                    && self.peer_key.verify(&digest, &endorsement.signature)
            })
    }

    /// Validate and append `transaction`, returning its commit event.
    fn validate_and_commit(&self, transaction: &EndorsedTransaction) -> CommitEvent {
        let tx_id = transaction.tx_id();
        let forced = self.faults().force_validation_code.clone();
        let rwset = transaction
            .responses
            .first()
            .and_then(|r| ReadWriteSet::from_bytes(&r.results));

        let mut state = self.write_ledger();
        let code = if state.has_seen(tx_id.as_str()) {
            ValidationCode::DuplicateTxId
        } else if !self.endorsement_is_valid(transaction) {
            ValidationCode::EndorsementPolicyFailure
        } else {
            match &rwset {
                Some(rwset) => state.validate(rwset),
                None => ValidationCode::BadPayload,
            }
        };
        let code = forced.unwrap_or(code);
        let block_number = state.commit_block(
            tx_id.as_str(),
            &rwset.unwrap_or_default(),
            &code,
            Utc::now(),
        );

        tracing::debug!(tx_id = tx_id.short(), block = block_number, %code, "block committed");
        CommitEvent {
            tx_id: tx_id.clone(),
            code,
            block_number,
            peer: self.peer_addr.clone(),
        }
    }

    fn publish(&self, event: CommitEvent) {
        if self.faults().drop_commit_events {
            tracing::debug!(tx_id = event.tx_id.short(), "dropping commit event");
            return;
        }
        if let Some((_, sender)) = self.registrations.remove(&event.tx_id) {
            bump(&self.counters.events_published);
            let _ = sender.send(event);
        }
    }
}

#[async_trait]
impl LedgerPlatform for SimulatedNetwork {
    async fn send_proposal(
        &self,
        channel: &Channel,
        proposal: &Proposal,
    ) -> anyhow::Result<Vec<ProposalResponse>> {
        bump(&self.inner.counters.proposals);
        self.inner.ensure_peer(channel)?;
        Ok(channel
            .peers()
            .iter()
            .map(|_| self.inner.endorse(proposal))
            .collect())
    }

    async fn send_transaction(
        &self,
        channel: &Channel,
        transaction: EndorsedTransaction,
    ) -> anyhow::Result<SubmissionAck> {
        bump(&self.inner.counters.transactions);
        match channel.orderer() {
            Some(addr) if addr == self.inner.orderer_addr => {}
            Some(addr) => bail!("orderer {addr} unreachable"),
            None => bail!("channel {} has no orderer attached", channel.id()),
        }

        let (ordering_status, delay) = {
            let faults = self.inner.faults();
            (faults.ordering_status.clone(), faults.commit_delay)
        };
        if let Some(status) = ordering_status {
            return Ok(SubmissionAck::rejected(status, "injected ordering failure"));
        }
        if !transaction.responses.iter().any(ProposalResponse::is_endorsed) {
            return Ok(SubmissionAck::rejected(
                "BAD_REQUEST",
                "transaction carries no endorsement",
            ));
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let event = inner.validate_and_commit(&transaction);
            inner.publish(event);
        });
        Ok(SubmissionAck::success())
    }

    async fn subscribe_commit_event(
        &self,
        event_addr: &str,
        tx_id: &TxId,
    ) -> anyhow::Result<CommitSubscription> {
        if event_addr != self.inner.event_addr {
            bail!("event hub {event_addr} unreachable");
        }
        bump(&self.inner.counters.hub_connections);
        bump(&self.inner.counters.registrations);

        let (sender, receiver) = oneshot::channel();
        self.inner.registrations.insert(tx_id.clone(), sender);
        let hub = HubConnection {
            inner: self.inner.clone(),
            addr: event_addr.to_string(),
        };
        Ok(CommitSubscription::new(tx_id.clone(), receiver, Box::new(hub)))
    }

    async fn query(
        &self,
        channel: &Channel,
        proposal: &Proposal,
    ) -> anyhow::Result<Vec<ProposalResponse>> {
        bump(&self.inner.counters.queries);
        self.inner.ensure_peer(channel)?;
        let (response, _) = self.inner.simulate(proposal);
        Ok(vec![ProposalResponse {
            peer: self.inner.peer_addr.clone(),
            status: response.status,
            message: response.message,
            payload: Bytes::from(response.payload),
            results: Bytes::new(),
            endorsement: None,
        }])
    }
}

struct HubConnection {
    inner: Arc<Inner>,
    addr: String,
}

impl EventHubConnection for HubConnection {
    fn peer_addr(&self) -> &str {
        &self.addr
    }

    fn unregister_tx_event(&mut self, tx_id: &TxId) {
        self.inner.registrations.remove(tx_id);
        bump(&self.inner.counters.unregistrations);
    }

    fn disconnect(&mut self) {
        bump(&self.inner.counters.disconnects);
    }
}

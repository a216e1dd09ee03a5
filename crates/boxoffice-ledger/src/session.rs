//! Per-request network session: the resolved identity, the channel with one
//! peer and one orderer attached, and the platform to talk through.

use std::sync::Arc;

use boxoffice_core::config::BoxOfficeConfig;
use boxoffice_core::{OperationRequest, TxId};

use crate::error::GatewayError;
use crate::platform::{Channel, LedgerPlatform, Proposal};
use crate::wallet::{CredentialStore, Identity};

pub struct NetworkSession {
    config: Arc<BoxOfficeConfig>,
    identity: Identity,
    channel: Channel,
    platform: Arc<dyn LedgerPlatform>,
}

impl NetworkSession {
    /// Open the credential store, resolve the configured user and attach the
    /// configured peer and orderer to the channel.
    ///
    /// No network traffic happens here.
    pub fn initialize(
        config: Arc<BoxOfficeConfig>,
        platform: Arc<dyn LedgerPlatform>,
    ) -> Result<Self, GatewayError> {
        let store = CredentialStore::open(&config.identity.wallet_path)?;
        let identity = store.resolve_identity(&config.identity.user_id)?;

        let mut channel = Channel::new(&config.ledger.channel_id, &config.ledger.chaincode_id);
        channel.add_peer(&config.ledger.peer);
        channel.add_orderer(&config.ledger.orderer);

        tracing::debug!(
            user = identity.name(),
            channel = channel.id(),
            peer = %config.ledger.peer,
            orderer = %config.ledger.orderer,
            "network session ready"
        );

        Ok(Self {
            config,
            identity,
            channel,
            platform,
        })
    }

    pub fn config(&self) -> &BoxOfficeConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn platform(&self) -> &dyn LedgerPlatform {
        self.platform.as_ref()
    }

    pub fn event_addr(&self) -> &str {
        &self.config.ledger.events
    }

    /// Build a proposal for `request` under a freshly minted transaction id.
    pub fn new_proposal(&self, request: OperationRequest) -> Proposal {
        let (tx_id, nonce) = TxId::mint(self.identity.public_key());
        Proposal::new(tx_id, nonce, &self.channel, request, self.identity.creator())
    }
}

//! `TicketGateway`: one entry point per request.
//!
//! Every call builds a fresh `NetworkSession`: identity resolution and channel
//! setup happen per request, and nothing is shared between requests except
//! the configuration and the platform handle.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use boxoffice_core::config::BoxOfficeConfig;
use boxoffice_core::{CommitOutcome, OperationRequest};

use crate::error::GatewayError;
use crate::platform::LedgerPlatform;
use crate::session::NetworkSession;
use crate::{commit, proposal, query};

#[derive(Clone)]
pub struct TicketGateway {
    config: Arc<BoxOfficeConfig>,
    platform: Arc<dyn LedgerPlatform>,
}

impl TicketGateway {
    pub fn new(config: Arc<BoxOfficeConfig>, platform: Arc<dyn LedgerPlatform>) -> Self {
        Self { config, platform }
    }

    pub fn config(&self) -> &BoxOfficeConfig {
        &self.config
    }

    fn session(&self) -> Result<NetworkSession, GatewayError> {
        NetworkSession::initialize(self.config.clone(), self.platform.clone())
    }

    /// Run the full submission workflow for a ledger-mutating operation:
    /// propose, check endorsements, then order and wait for the commit event.
    pub async fn submit(&self, request: OperationRequest) -> Result<CommitOutcome, GatewayError> {
        let session = self.session()?;
        let proposal = session.new_proposal(request);
        tracing::info!(
            tx_id = %proposal.tx_id,
            function = %proposal.request.function,
            user = session.identity().name(),
            "submitting transaction"
        );

        let endorsed = proposal::endorse(&session, proposal).await?;
        commit::order_and_confirm(&session, endorsed, self.config.ledger.commit_timeout()).await
    }

    /// Evaluate a read-only operation against one peer.
    pub async fn evaluate(&self, request: OperationRequest) -> Result<Value, GatewayError> {
        let session = self.session()?;
        query::evaluate(&session, request).await
    }

    pub async fn evaluate_as<T: DeserializeOwned>(
        &self,
        request: OperationRequest,
    ) -> Result<T, GatewayError> {
        let session = self.session()?;
        query::evaluate_as(&session, request).await
    }
}

//! Read-only evaluation. Queries go to a single peer and are never ordered.

use serde::de::DeserializeOwned;
use serde_json::Value;

use boxoffice_core::ledger::STATUS_OK;
use boxoffice_core::OperationRequest;

use crate::error::GatewayError;
use crate::session::NetworkSession;

/// Evaluate `request` and parse the peer's payload as JSON.
pub async fn evaluate(
    session: &NetworkSession,
    request: OperationRequest,
) -> Result<Value, GatewayError> {
    let proposal = session.new_proposal(request);
    let responses = session
        .platform()
        .query(session.channel(), &proposal)
        .await
        .map_err(|e| GatewayError::Query(format!("{e:#}")))?;

    let response = responses
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Query("no response from peer".to_string()))?;
    if response.status != STATUS_OK {
        return Err(GatewayError::Query(format!(
            "peer {} answered status {}: {}",
            response.peer, response.status, response.message
        )));
    }

    tracing::debug!(
        function = %proposal.request.function,
        peer = %response.peer,
        bytes = response.payload.len(),
        "query evaluated"
    );
    parse_payload(&response.payload)
}

/// Parse a query payload as JSON.
pub fn parse_payload(payload: &[u8]) -> Result<Value, GatewayError> {
    if payload.is_empty() {
        return Err(GatewayError::Query("empty query result".to_string()));
    }
    serde_json::from_slice(payload)
        .map_err(|e| GatewayError::Query(format!("query result is not JSON: {e}")))
}

/// Evaluate `request` and deserialize the result into `T`.
pub async fn evaluate_as<T: DeserializeOwned>(
    session: &NetworkSession,
    request: OperationRequest,
) -> Result<T, GatewayError> {
    let value = evaluate(session, request).await?;
    serde_json::from_value(value)
        .map_err(|e| GatewayError::Query(format!("unexpected query result shape: {e}")))
}

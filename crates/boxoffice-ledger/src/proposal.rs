//! Endorsement phase: send a proposal to the channel's peers and decide
//! whether the responses are good enough to order.

use boxoffice_core::config::EndorsementPolicy;
use boxoffice_core::ProposalResponse;

use crate::error::GatewayError;
use crate::platform::{EndorsedTransaction, Proposal};
use crate::session::NetworkSession;

/// Collect endorsements for `proposal`.
///
/// A rejected proposal never reaches the ordering service.
pub async fn endorse(
    session: &NetworkSession,
    proposal: Proposal,
) -> Result<EndorsedTransaction, GatewayError> {
    let responses = session
        .platform()
        .send_proposal(session.channel(), &proposal)
        .await
        .map_err(|e| GatewayError::ProposalRejected(format!("no answer from peers: {e:#}")))?;

    check_endorsements(
        &responses,
        session.channel().peers().len(),
        session.config().ledger.endorsement,
    )?;

    if let Some(first) = responses.first() {
        tracing::info!(
            tx_id = proposal.tx_id.short(),
            function = %proposal.request.function,
            peer = %first.peer,
            status = first.status,
            message = %first.message,
            "proposal endorsed"
        );
    }

    Ok(EndorsedTransaction {
        proposal,
        responses,
    })
}

/// Apply the endorsement policy to a set of proposal responses.
///
/// `First` looks only at the first response. `All` needs every attached peer
/// to have answered and every answer to be endorsed.
pub fn check_endorsements(
    responses: &[ProposalResponse],
    expected_peers: usize,
    policy: EndorsementPolicy,
) -> Result<(), GatewayError> {
    let first = responses
        .first()
        .ok_or_else(|| GatewayError::ProposalRejected("no proposal responses".to_string()))?;

    match policy {
        EndorsementPolicy::First => ensure_endorsed(first),
        EndorsementPolicy::All => {
            if responses.len() < expected_peers {
                return Err(GatewayError::ProposalRejected(format!(
                    "only {} of {} peers answered",
                    responses.len(),
                    expected_peers
                )));
            }
            responses.iter().try_for_each(ensure_endorsed)
        }
    }
}

fn ensure_endorsed(response: &ProposalResponse) -> Result<(), GatewayError> {
    if response.is_endorsed() {
        return Ok(());
    }
    let reason = if response.message.is_empty() {
        "no endorsement"
    } else {
        response.message.as_str()
    };
    Err(GatewayError::ProposalRejected(format!(
        "peer {} answered status {}: {}",
        response.peer, response.status, reason
    )))
}

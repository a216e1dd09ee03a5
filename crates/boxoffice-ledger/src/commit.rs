//! Ordering and commit confirmation.
//!
//! The event hub registration is made before the transaction is broadcast so
//! a fast commit cannot slip past it. Ordering and the wait for the commit
//! event then run concurrently; the attempt succeeds only if both do.

use std::time::Duration;

use boxoffice_core::{CommitOutcome, SubmissionAck, TxId};

use crate::error::GatewayError;
use crate::platform::{Channel, CommitSubscription, EndorsedTransaction, LedgerPlatform};
use crate::session::NetworkSession;

/// Broadcast `transaction` and wait up to `timeout` for both the ordering
/// answer and its commit event.
///
/// The subscription is torn down exactly once whatever the outcome.
pub async fn order_and_confirm(
    session: &NetworkSession,
    transaction: EndorsedTransaction,
    timeout: Duration,
) -> Result<CommitOutcome, GatewayError> {
    let tx_id = transaction.tx_id().clone();
    let platform = session.platform();

    let mut subscription = platform
        .subscribe_commit_event(session.event_addr(), &tx_id)
        .await
        .map_err(|e| GatewayError::EventHub(format!("{e:#}")))?;

    // The deadline bounds ordering too: an event alone does not finish the
    // attempt while the orderer has not answered.
    let joined = tokio::time::timeout(timeout, async {
        tokio::try_join!(
            broadcast(platform, session.channel(), transaction),
            await_commit(&mut subscription, timeout),
        )
    })
    .await;
    subscription.close();

    let result = joined.unwrap_or_else(|_| {
        tracing::warn!(tx_id = %tx_id, ?timeout, "ordering unanswered before timeout");
        Err(GatewayError::CommitTimeout {
            tx_id: tx_id.clone(),
            timeout,
        })
    });

    let (ack, outcome) = result?;
    tracing::info!(
        tx_id = %tx_id,
        block = outcome.block_number,
        peer = %outcome.peer,
        ordering = %ack.status,
        "transaction committed"
    );
    Ok(outcome)
}

async fn broadcast(
    platform: &dyn LedgerPlatform,
    channel: &Channel,
    transaction: EndorsedTransaction,
) -> Result<SubmissionAck, GatewayError> {
    let tx_id = transaction.tx_id().clone();
    let ack = platform
        .send_transaction(channel, transaction)
        .await
        .map_err(|e| GatewayError::OrderingRejected {
            tx_id: tx_id.clone(),
            status: "UNAVAILABLE".to_string(),
            info: format!("{e:#}"),
        })?;

    if !ack.accepted() {
        tracing::warn!(tx_id = %tx_id, status = %ack.status, info = %ack.info, "ordering rejected transaction");
        return Err(GatewayError::OrderingRejected {
            tx_id,
            status: ack.status,
            info: ack.info,
        });
    }
    tracing::debug!(tx_id = tx_id.short(), "transaction accepted for ordering");
    Ok(ack)
}

async fn await_commit(
    subscription: &mut CommitSubscription,
    timeout: Duration,
) -> Result<CommitOutcome, GatewayError> {
    let tx_id: TxId = subscription.tx_id().clone();
    let event = tokio::time::timeout(timeout, subscription.next_event()).await;
    subscription.close();

    match event {
        Err(_) => {
            tracing::warn!(tx_id = %tx_id, ?timeout, "no commit event before timeout");
            Err(GatewayError::CommitTimeout { tx_id, timeout })
        }
        Ok(None) => Err(GatewayError::EventHub(format!(
            "event hub closed before the commit event for {tx_id}"
        ))),
        Ok(Some(event)) if event.code.is_valid() => Ok(event.into()),
        Ok(Some(event)) => {
            tracing::warn!(tx_id = %tx_id, code = %event.code, peer = %event.peer, "transaction invalidated");
            Err(GatewayError::InvalidTransaction {
                tx_id,
                code: event.code,
            })
        }
    }
}

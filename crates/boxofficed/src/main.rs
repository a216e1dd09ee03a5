//! boxofficed: ticket gateway daemon.
//!
//!   boxofficed [serve]        serve the HTTP API against the ledger network
//!   boxofficed enroll [user]  enroll a user in the credential store

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use boxoffice_api::ApiState;
use boxoffice_core::config::BoxOfficeConfig;
use boxoffice_ledger::sim::SimulatedNetwork;
use boxoffice_ledger::{CredentialStore, TicketGateway};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = BoxOfficeConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = BoxOfficeConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        BoxOfficeConfig::default()
    });
    let config = Arc::new(config);

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => serve(config).await,
        Some("enroll") => {
            let user = args
                .next()
                .unwrap_or_else(|| config.identity.user_id.clone());
            enroll(&config, &user)
        }
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("unknown command: {}", other)
        }
    }
}

fn print_usage() {
    eprintln!("usage: boxofficed [serve]");
    eprintln!("       boxofficed enroll [user]");
}

fn enroll(config: &BoxOfficeConfig, user: &str) -> Result<()> {
    let store = CredentialStore::open(&config.identity.wallet_path)?;
    let identity = store
        .enroll(user, &config.identity.msp_id)
        .with_context(|| format!("failed to enroll {}", user))?;
    println!(
        "enrolled {} ({}) in {}",
        identity.name(),
        identity.msp_id(),
        store.path().display()
    );
    Ok(())
}

async fn serve(config: Arc<BoxOfficeConfig>) -> Result<()> {
    tracing::info!(
        channel = %config.ledger.channel_id,
        chaincode = %config.ledger.chaincode_id,
        user = %config.identity.user_id,
        "boxofficed starting"
    );

    // Requests resolve the identity themselves; this is only an early warning.
    let identity = CredentialStore::open(&config.identity.wallet_path)
        .and_then(|store| store.resolve_identity(&config.identity.user_id));
    match identity {
        Ok(identity) => tracing::info!(user = identity.name(), msp_id = identity.msp_id(), "identity ready"),
        Err(e) => tracing::warn!(
            error = %e,
            "identity unusable; every request will fail until `boxofficed enroll` is run"
        ),
    }

    let network = SimulatedNetwork::new(&config.ledger);
    tracing::info!(
        peer = %config.ledger.peer,
        orderer = %config.ledger.orderer,
        events = %config.ledger.events,
        "simulated ledger network ready"
    );
    let gateway = TicketGateway::new(config.clone(), Arc::new(network.clone()));

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut api_shutdown = shutdown_tx.subscribe();

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let addr = format!("{}:{}", config.api.bind, config.api.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", addr))?;
    let mut api_task = tokio::spawn(boxoffice_api::serve_on(
        listener,
        ApiState { gateway },
        async move {
            let _ = api_shutdown.recv().await;
        },
    ));

    let stats_printer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let stats = network.stats();
            tracing::info!(
                height = network.height(),
                proposals = stats.proposals,
                transactions = stats.transactions,
                queries = stats.queries,
                open_registrations = network.open_registrations(),
                "ledger stats"
            );
        }
    });

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = &mut api_task => {
            stats_printer.abort();
            return r.context("API task panicked")?;
        }
    }

    stats_printer.abort();
    api_task.await.context("API task panicked")?
}

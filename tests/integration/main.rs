//! Box Office integration test harness.
//!
//! Each test boots the full HTTP gateway on an ephemeral loopback port, backed
//! by its own simulated ledger network and a freshly enrolled wallet, and
//! drives it over real HTTP:
//!
//!   cargo test --test integration
//!
//! Gateways are torn down when their `Gateway` handle drops.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use boxoffice_api::{serve_on, ApiState};
use boxoffice_core::config::BoxOfficeConfig;
use boxoffice_ledger::sim::SimulatedNetwork;
use boxoffice_ledger::{CredentialStore, TicketGateway};

mod failures;
mod queries;
mod tickets;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A running gateway and the network behind it.
pub struct Gateway {
    pub base: String,
    pub network: SimulatedNetwork,
    pub client: reqwest::Client,
    wallet: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for Gateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = std::fs::remove_dir_all(&self.wallet);
    }
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET and return (status, body).
    pub async fn get(&self, path: &str) -> Result<(u16, String)> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok((response.status().as_u16(), response.text().await?))
    }

    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let (status, body) = self.get(path).await?;
        anyhow::ensure!(status == 200, "GET {path} answered {status}: {body}");
        serde_json::from_str(&body).with_context(|| format!("GET {path} is not JSON: {body}"))
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<(u16, String)> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        Ok((response.status().as_u16(), response.text().await?))
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> Result<(u16, String)> {
        let response = self.client.put(self.url(path)).json(&body).send().await?;
        Ok((response.status().as_u16(), response.text().await?))
    }

    pub async fn create(&self, id: &str, price: u64, day: i32, seat: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/create",
                serde_json::json!({ "id": id, "price": price, "day": day, "seat": seat }),
            )
            .await?;
        anyhow::ensure!(status == 200, "create {id} answered {status}: {body}");
        Ok(body)
    }
}

/// Start a gateway with default settings.
pub async fn start(tag: &str) -> Gateway {
    start_with(tag, |_| {}).await
}

/// Start a gateway after adjusting its configuration. The `admin` identity is
/// enrolled before `tune` runs, so switching `identity.user_id` there yields a
/// gateway whose user has no credentials.
pub async fn start_with(tag: &str, tune: impl FnOnce(&mut BoxOfficeConfig)) -> Gateway {
    let wallet = std::env::temp_dir().join(format!("boxoffice-it-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&wallet);

    let mut config = BoxOfficeConfig::default();
    config.identity.wallet_path = wallet.clone();
    config.ledger.commit_timeout_ms = 3_000;
    CredentialStore::open(&wallet)
        .unwrap()
        .enroll(&config.identity.user_id, &config.identity.msp_id)
        .unwrap();
    tune(&mut config);

    let network = SimulatedNetwork::new(&config.ledger);
    let gateway = TicketGateway::new(Arc::new(config), Arc::new(network.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(serve_on(listener, ApiState { gateway }, async move {
        let _ = shutdown_rx.await;
    }));

    Gateway {
        base: format!("http://{}/api", addr),
        network,
        client: reqwest::Client::new(),
        wallet,
        shutdown: Some(shutdown_tx),
    }
}

pub fn is_tx_id(body: &str) -> bool {
    body.len() == 64 && body.chars().all(|c| c.is_ascii_hexdigit())
}

//! Shared HTTP request helpers for CLI commands.
//!
//! The gateway answers failures with 400 and a plain-text `<Kind>: <message>`
//! body; those become command errors carrying that text.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Method, Response, Url};
use serde::{Deserialize, Serialize};

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

/// `base_url` followed by `segments`, each percent-encoded as one path
/// segment.
pub fn resource_url(port: u16, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(&base_url(port)).context("invalid API url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API url cannot carry a path"))?
        .extend(segments);
    Ok(url.to_string())
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{} ({})", body.trim(), status)
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to boxofficed at {} (is it running?)", url))?;
    check(response)
        .await?
        .json::<T>()
        .await
        .context("failed to parse response")
}

/// Send a JSON body and return the plain-text answer (a transaction id).
pub async fn send_json_body<T: Serialize>(method: Method, url: &str, body: &T) -> Result<String> {
    let response = reqwest::Client::new()
        .request(method, url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("failed to connect to boxofficed at {} (is it running?)", url))?;
    check(response)
        .await?
        .text()
        .await
        .context("failed to read response")
}

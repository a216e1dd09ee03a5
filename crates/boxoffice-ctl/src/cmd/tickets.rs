//! Ticket mutation commands. Each waits for the ledger commit and prints the
//! transaction id.

use anyhow::Result;
use reqwest::Method;
use serde::Serialize;

use super::http::{base_url, send_json_body};

#[derive(Serialize)]
struct CreateRequest<'a> {
    id: &'a str,
    price: &'a str,
    day: &'a str,
    seat: &'a str,
}

#[derive(Serialize)]
struct RepriceRequest<'a> {
    id: &'a str,
    #[serde(rename = "newPrice")]
    new_price: &'a str,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    id: &'a str,
    #[serde(rename = "newOwner")]
    new_owner: &'a str,
}

#[derive(Serialize)]
struct IdRequest<'a> {
    id: &'a str,
}

fn committed(action: &str, id: &str, tx_id: &str) {
    println!("{} {}", action, id);
    println!("  tx : {}", tx_id.trim());
}

pub async fn cmd_create(port: u16, id: &str, price: &str, day: &str, seat: &str) -> Result<()> {
    let body = CreateRequest { id, price, day, seat };
    let tx_id = send_json_body(Method::POST, &format!("{}/create", base_url(port)), &body).await?;
    committed("Created ticket", id, &tx_id);
    Ok(())
}

pub async fn cmd_reprice(port: u16, id: &str, new_price: &str) -> Result<()> {
    let body = RepriceRequest { id, new_price };
    let tx_id = send_json_body(Method::PUT, &format!("{}/reprice", base_url(port)), &body).await?;
    committed("Repriced ticket", id, &tx_id);
    Ok(())
}

pub async fn cmd_transfer(port: u16, id: &str, new_owner: &str) -> Result<()> {
    let body = TransferRequest { id, new_owner };
    let tx_id = send_json_body(Method::PUT, &format!("{}/transfer", base_url(port)), &body).await?;
    committed("Transferred ticket", id, &tx_id);
    Ok(())
}

pub async fn cmd_lock(port: u16, id: &str) -> Result<()> {
    let tx_id = send_json_body(Method::PUT, &format!("{}/lock", base_url(port)), &IdRequest { id }).await?;
    committed("Locked ticket", id, &tx_id);
    Ok(())
}

pub async fn cmd_delete(port: u16, id: &str) -> Result<()> {
    let tx_id = send_json_body(Method::POST, &format!("{}/delete", base_url(port)), &IdRequest { id }).await?;
    committed("Deleted ticket", id, &tx_id);
    Ok(())
}

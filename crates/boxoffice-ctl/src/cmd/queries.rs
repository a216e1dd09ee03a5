//! Read-only commands.

use anyhow::Result;
use serde::Deserialize;

use boxoffice_core::{HistoryEntry, Ticket, TicketRecord};

use super::http::{base_url, get_json, resource_url};

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

/// Leading 16 bytes of a transaction id, or all of it when that would split
/// a character.
fn short(tx_id: &str) -> &str {
    tx_id.get(..16).unwrap_or(tx_id)
}

fn print_ticket(ticket: &Ticket) {
    let owner = if ticket.owner.is_empty() { "(unsold)" } else { ticket.owner.as_str() };
    println!("  ┌─ {}", ticket.id);
    println!("  │  price  : {}", ticket.price);
    println!("  │  day    : {}", ticket.day);
    println!("  │  seat   : {}", ticket.seat);
    println!("  │  owner  : {}", owner);
    println!("  └─ locked : {}", ticket.is_locked());
}

fn print_records(title: &str, records: &[TicketRecord]) {
    println!("═══════════════════════════════════════");
    println!("  {} ({})", title, records.len());
    println!("═══════════════════════════════════════");
    for record in records {
        print_ticket(&record.ticket);
    }
}

pub async fn cmd_ticket(port: u16, id: &str) -> Result<()> {
    let ticket: Ticket = get_json(&resource_url(port, &["ticket", id])?).await?;
    print_ticket(&ticket);
    Ok(())
}

pub async fn cmd_owner(port: u16, owner: &str) -> Result<()> {
    let records: Vec<TicketRecord> =
        get_json(&resource_url(port, &["ticketbyowner", owner])?).await?;
    if records.is_empty() {
        println!("No tickets owned by {}.", owner);
        return Ok(());
    }
    print_records(&format!("Tickets owned by {}", owner), &records);
    Ok(())
}

pub async fn cmd_all(port: u16) -> Result<()> {
    let records: Vec<TicketRecord> = get_json(&format!("{}/alltickets", base_url(port))).await?;
    if records.is_empty() {
        println!("No tickets on the ledger.");
        return Ok(());
    }
    print_records("All tickets", &records);
    Ok(())
}

pub async fn cmd_history(port: u16, id: &str) -> Result<()> {
    let entries: Vec<HistoryEntry> =
        get_json(&resource_url(port, &["ticketHistory", id])?).await?;
    if entries.is_empty() {
        println!("No history for ticket {}.", id);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  History of {} ({} changes)", id, entries.len());
    println!("═══════════════════════════════════════");
    for entry in &entries {
        println!("  ┌─ {}", short(&entry.tx_id));
        println!("  │  at     : {}", entry.timestamp);
        match &entry.value {
            Some(t) if entry.is_delete != "true" => {
                let owner = if t.owner.is_empty() { "(unsold)" } else { t.owner.as_str() };
                println!("  │  price  : {}", t.price);
                println!("  └─ owner  : {}{}", owner, if t.is_locked() { " (locked)" } else { "" });
            }
            _ => println!("  └─ deleted"),
        }
    }
    Ok(())
}

pub async fn cmd_version(port: u16) -> Result<()> {
    let resp: VersionResponse = get_json(&format!("{}/version", base_url(port))).await?;
    println!("boxoffice API {}", resp.version);
    Ok(())
}

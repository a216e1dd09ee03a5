//! boxoffice-ctl: command-line interface for the Box Office gateway.

use anyhow::{Context, Result};

mod cmd;

use cmd::queries::{cmd_all, cmd_history, cmd_owner, cmd_ticket, cmd_version};
use cmd::tickets::{cmd_create, cmd_delete, cmd_lock, cmd_reprice, cmd_transfer};

const DEFAULT_PORT: u16 = 8000;

fn print_usage() {
    eprintln!("usage: boxoffice-ctl [--port N] <command>");
    eprintln!();
    eprintln!("  create <id> <price> <day> <seat>   generate a ticket");
    eprintln!("  reprice <id> <price>               change the price of an unsold ticket");
    eprintln!("  transfer <id> <owner>              sell or resell a ticket");
    eprintln!("  lock <id>                          lock a sold ticket");
    eprintln!("  delete <id>                        delete a ticket");
    eprintln!("  ticket <id>                        show one ticket");
    eprintln!("  owner <name>                       tickets owned by <name>");
    eprintln!("  history <id>                       change history of a ticket");
    eprintln!("  all                                every ticket on the ledger");
    eprintln!("  version                            gateway API version");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["create", id, price, day, seat] => cmd_create(port, id, price, day, seat).await,
        ["reprice", id, price]           => cmd_reprice(port, id, price).await,
        ["transfer", id, owner]          => cmd_transfer(port, id, owner).await,
        ["lock", id]                     => cmd_lock(port, id).await,
        ["delete", id]                   => cmd_delete(port, id).await,
        ["ticket", id]                   => cmd_ticket(port, id).await,
        ["owner", name]                  => cmd_owner(port, name).await,
        ["history", id]                  => cmd_history(port, id).await,
        ["all"] | []                     => cmd_all(port).await,
        ["version"]                      => cmd_version(port).await,
        ["help"] | ["--help"] | ["-h"]   => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

// ── Ticket lifecycle over HTTP ────────────────────────────────────────────────

use crate::*;
use serde_json::json;

#[tokio::test]
async fn test_ticket_lifecycle() {
    let gw = start("lifecycle").await;

    let tx = gw.create("T1", 100, 5, "A1").await.unwrap();
    assert!(is_tx_id(&tx), "create should answer a tx id, got {tx:?}");

    let (status, body) = gw.put("/reprice", json!({ "id": "T1", "newPrice": "80" })).await.unwrap();
    assert_eq!(status, 200, "reprice: {body}");

    let (status, body) = gw.put("/transfer", json!({ "id": "T1", "newOwner": "Bob" })).await.unwrap();
    assert_eq!(status, 200, "transfer: {body}");

    let (status, body) = gw.put("/lock", json!({ "id": "T1" })).await.unwrap();
    assert_eq!(status, 200, "lock: {body}");

    let ticket = gw.get_json("/ticket/T1").await.unwrap();
    assert_eq!(ticket["price"], 80);
    assert_eq!(ticket["owner"], "bob");
    assert_eq!(ticket["locked"], true);
    assert_eq!(ticket["docType"], "ticket");

    // Four committed transactions, four blocks.
    assert_eq!(gw.network.height(), 4);
    assert_eq!(gw.network.open_registrations(), 0);
}

#[tokio::test]
async fn test_each_submission_gets_its_own_tx_id() {
    let gw = start("txids").await;

    let a = gw.create("T1", 10, 1, "A1").await.unwrap();
    let b = gw.create("T2", 10, 1, "A2").await.unwrap();
    assert_ne!(a, b);

    let history = gw.get_json("/ticketHistory/T1").await.unwrap();
    assert_eq!(history[0]["TxId"], a.as_str());
}

#[tokio::test]
async fn test_delete_keeps_history() {
    let gw = start("delete").await;
    gw.create("T1", 100, 5, "A1").await.unwrap();

    let (status, tx) = gw.post("/delete", json!({ "id": "T1" })).await.unwrap();
    assert_eq!(status, 200);
    assert!(is_tx_id(&tx));

    let (status, body) = gw.get("/ticket/T1").await.unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("QueryError: "), "{body}");

    let history = gw.get_json("/ticketHistory/T1").await.unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["IsDelete"], "true");
    assert_eq!(entries[1]["TxId"], tx.as_str());
}

#[tokio::test]
async fn test_form_encoded_submissions() {
    let gw = start("form").await;

    let response = gw
        .client
        .post(gw.url("/create"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("id=T7&price=25&day=3&seat=C9")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(is_tx_id(&response.text().await.unwrap()));

    let ticket = gw.get_json("/ticket/T7").await.unwrap();
    assert_eq!(ticket["seat"], "C9");
    assert_eq!(ticket["price"], 25);
}

#[tokio::test]
async fn test_concurrent_transfers_conflict() {
    let gw = start("race").await;
    gw.create("T1", 100, 5, "A1").await.unwrap();

    // Both transactions read the same version before either commits.
    gw.network.set_faults(boxoffice_ledger::sim::SimulationFaults {
        commit_delay: std::time::Duration::from_millis(100),
        ..Default::default()
    });

    let (a, b) = tokio::join!(
        gw.put("/transfer", json!({ "id": "T1", "newOwner": "alice" })),
        gw.put("/transfer", json!({ "id": "T1", "newOwner": "bob" })),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [200, 400], "a={a:?} b={b:?}");

    let loser = if a.0 == 400 { &a.1 } else { &b.1 };
    assert!(loser.starts_with("InvalidTransaction: "), "{loser}");
    assert!(loser.contains("MVCC_READ_CONFLICT"), "{loser}");
    assert_eq!(gw.network.open_registrations(), 0);
}

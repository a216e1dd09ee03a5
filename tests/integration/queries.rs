// ── Read-only endpoints ───────────────────────────────────────────────────────

use crate::*;
use serde_json::json;

#[tokio::test]
async fn test_version() {
    let gw = start("version").await;
    let version = gw.get_json("/version").await.unwrap();
    assert_eq!(version, json!({ "version": "1.0.0" }));
}

#[tokio::test]
async fn test_empty_ledger_queries() {
    let gw = start("empty").await;

    let (status, body) = gw.get("/ticketbyowner/Alice").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "[]");

    let (status, body) = gw.get("/alltickets").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "[]");

    let stats = gw.network.stats();
    assert_eq!(stats.transactions, 0);
    assert_eq!(stats.hub_connections, 0);
}

#[tokio::test]
async fn test_owner_and_listing() {
    let gw = start("owner").await;
    gw.create("T1", 10, 1, "A1").await.unwrap();
    gw.create("T2", 20, 1, "A2").await.unwrap();
    gw.create("T3", 30, 2, "B1").await.unwrap();
    for id in ["T1", "T3"] {
        let (status, body) = gw
            .put("/transfer", json!({ "id": id, "newOwner": "dave" }))
            .await
            .unwrap();
        assert_eq!(status, 200, "{body}");
    }

    let owned = gw.get_json("/ticketbyowner/dave").await.unwrap();
    let ids: Vec<&str> = owned
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["T1", "T3"]);

    // Owners are stored lower-cased.
    let (_, body) = gw.get("/ticketbyowner/Dave").await.unwrap();
    assert_eq!(body, "[]");

    let all = gw.get_json("/alltickets").await.unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1]["ticket"]["price"], 20);

    // Queries never reach the ordering service.
    assert_eq!(gw.network.height(), 5);
}

#[tokio::test]
async fn test_unknown_ticket() {
    let gw = start("unknown").await;
    let (status, body) = gw.get("/ticket/NOPE").await.unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("QueryError: "), "{body}");
    assert!(body.contains("NOPE"), "{body}");
}

// ── Failure surfaces ──────────────────────────────────────────────────────────

use crate::*;
use boxoffice_core::ValidationCode;
use boxoffice_ledger::sim::SimulationFaults;
use serde_json::json;

#[tokio::test]
async fn test_invalid_commit_is_reported() {
    let gw = start("mvcc").await;
    gw.network.set_faults(SimulationFaults {
        force_validation_code: Some(ValidationCode::MvccReadConflict),
        ..Default::default()
    });

    let (status, body) = gw
        .post("/create", json!({ "id": "T1", "price": 100, "day": 5, "seat": "A1" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("InvalidTransaction: "), "{body}");
    assert!(body.contains("MVCC_READ_CONFLICT"), "{body}");

    // Invalid transactions are recorded in a block but change nothing.
    assert_eq!(gw.network.height(), 1);
    let (_, body) = gw.get("/alltickets").await.unwrap();
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_commit_timeout() {
    let gw = start_with("timeout", |c| c.ledger.commit_timeout_ms = 200).await;
    gw.network.set_faults(SimulationFaults {
        drop_commit_events: true,
        ..Default::default()
    });

    let started = std::time::Instant::now();
    let (status, body) = gw
        .post("/create", json!({ "id": "T1", "price": 100, "day": 5, "seat": "A1" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("CommitTimeout: "), "{body}");
    assert!(started.elapsed() < std::time::Duration::from_secs(3));

    let stats = gw.network.stats();
    assert_eq!(stats.unregistrations, 1);
    assert_eq!(stats.disconnects, 1);
    assert_eq!(gw.network.open_registrations(), 0);
}

#[tokio::test]
async fn test_unenrolled_user() {
    let gw = start_with("nobody", |c| c.identity.user_id = "nobody".into()).await;

    let (status, body) = gw
        .post("/create", json!({ "id": "T1", "price": 100, "day": 5, "seat": "A1" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("IdentityError: "), "{body}");

    let (status, body) = gw.get("/alltickets").await.unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("IdentityError: "), "{body}");

    assert_eq!(gw.network.stats().proposals, 0);
}

#[tokio::test]
async fn test_chaincode_rejection() {
    let gw = start("rejected").await;
    gw.create("T1", 100, 5, "A1").await.unwrap();

    // Unsold tickets cannot be locked.
    let (status, body) = gw.put("/lock", json!({ "id": "T1" })).await.unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("ProposalRejected: "), "{body}");
    assert!(body.contains("Can not lock an unsold ticket"), "{body}");

    let (status, body) = gw
        .post("/create", json!({ "id": "T1", "price": 1, "day": 1, "seat": "Z9" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert!(body.contains("This ticket already exists: T1"), "{body}");

    // Only the first create reached the orderer.
    assert_eq!(gw.network.stats().transactions, 1);
    assert_eq!(gw.network.stats().hub_connections, 1);
}

#[tokio::test]
async fn test_ordering_rejection() {
    let gw = start("ordering").await;
    gw.network.set_faults(SimulationFaults {
        ordering_status: Some("SERVICE_UNAVAILABLE".into()),
        ..Default::default()
    });

    let (status, body) = gw
        .post("/create", json!({ "id": "T1", "price": 100, "day": 5, "seat": "A1" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert!(body.starts_with("OrderingRejected: "), "{body}");
    assert!(body.contains("SERVICE_UNAVAILABLE"), "{body}");
    assert_eq!(gw.network.open_registrations(), 0);
}

#[tokio::test]
async fn test_malformed_body() {
    let gw = start("malformed").await;

    let (status, _) = gw.post("/create", json!({ "id": "T1", "price": 100 })).await.unwrap();
    assert_eq!(status, 400);

    let (status, _) = gw
        .put("/reprice", json!({ "id": "T1", "newPrice": "cheap" }))
        .await
        .unwrap();
    assert_eq!(status, 400);
}

pub mod handlers;

use std::future::Future;

use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::ApiState;

/// The full HTTP surface, routes nested under `/api`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/create", post(handlers::handle_create))
        .route("/reprice", put(handlers::handle_reprice))
        .route("/transfer", put(handlers::handle_transfer))
        .route("/lock", put(handlers::handle_lock))
        .route("/delete", post(handlers::handle_delete))
        .route("/ticketbyowner/{id}", get(handlers::handle_ticket_by_owner))
        .route("/ticketHistory/{id}", get(handlers::handle_ticket_history))
        .route("/alltickets", get(handlers::handle_all_tickets))
        .route("/ticket/{id}", get(handlers::handle_ticket))
        .route("/version", get(handlers::handle_version))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on(
    listener: TcpListener,
    state: ApiState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use boxoffice_core::config::BoxOfficeConfig;
    use boxoffice_core::ValidationCode;
    use boxoffice_ledger::sim::{SimulatedNetwork, SimulationFaults};
    use boxoffice_ledger::{CredentialStore, TicketGateway};

    struct TestApp {
        router: Router,
        network: SimulatedNetwork,
        wallet: PathBuf,
    }

    impl Drop for TestApp {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.wallet);
        }
    }

    fn app(tag: &str) -> TestApp {
        let wallet = std::env::temp_dir().join(format!("boxoffice-api-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&wallet);

        let mut config = BoxOfficeConfig::default();
        config.identity.wallet_path = wallet.clone();
        config.ledger.commit_timeout_ms = 2_000;
        CredentialStore::open(&wallet)
            .unwrap()
            .enroll(&config.identity.user_id, &config.identity.msp_id)
            .unwrap();

        let network = SimulatedNetwork::new(&config.ledger);
        let gateway = TicketGateway::new(Arc::new(config), Arc::new(network.clone()));
        TestApp {
            router: router(ApiState { gateway }),
            network,
            wallet,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn json(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn version_is_fixed() {
        let app = app("version");
        let (status, body) = send(&app.router, get("/api/version")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"version":"1.0.0"}"#);
    }

    #[tokio::test]
    async fn create_returns_tx_id() {
        let app = app("create");
        let (status, body) = send(
            &app.router,
            json("POST", "/api/create", r#"{"id":"T1","price":100,"day":5,"seat":"A1"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body.len(), 64);
        assert!(body.chars().all(|c| c.is_ascii_hexdigit()));

        let (status, body) = send(&app.router, get("/api/ticket/T1")).await;
        assert_eq!(status, StatusCode::OK);
        let ticket: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(ticket["seat"], "A1");
        assert_eq!(ticket["day"], 5);
    }

    #[tokio::test]
    async fn form_bodies_are_accepted() {
        let app = app("form");
        let request = Request::builder()
            .method("POST")
            .uri("/api/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("id=T2&price=50&day=1&seat=B7"))
            .unwrap();
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .method("PUT")
            .uri("/api/transfer")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("id=T2&newOwner=Carol"))
            .unwrap();
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app.router, get("/api/ticketbyowner/carol")).await;
        let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(rows[0]["id"], "T2");
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let app = app("missing");
        let (status, _) = send(
            &app.router,
            json("POST", "/api/create", r#"{"id":"T1","price":100,"day":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app.router, json("PUT", "/api/lock", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.network.stats().proposals, 0);
    }

    #[tokio::test]
    async fn invalid_commit_names_the_code() {
        let app = app("mvcc");
        app.network.set_faults(SimulationFaults {
            force_validation_code: Some(ValidationCode::MvccReadConflict),
            ..Default::default()
        });
        let (status, body) = send(
            &app.router,
            json("POST", "/api/create", r#"{"id":"T1","price":"100","day":"5","seat":"A1"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("InvalidTransaction: "), "{body}");
        assert!(body.contains("MVCC_READ_CONFLICT"));
    }

    #[tokio::test]
    async fn chaincode_refusal_is_proposal_rejected() {
        let app = app("refusal");
        let (status, body) = send(&app.router, json("PUT", "/api/lock", r#"{"id":"T9"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("ProposalRejected: "), "{body}");
        assert!(body.contains("Ticket not found: T9"));
    }

    #[tokio::test]
    async fn empty_ledger_queries_return_empty_lists() {
        let app = app("empty");
        for uri in ["/api/ticketbyowner/Alice", "/api/alltickets", "/api/ticketHistory/T1"] {
            let (status, body) = send(&app.router, get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, "[]", "{uri}");
        }
        let stats = app.network.stats();
        assert_eq!(stats.queries, 3);
        assert_eq!(stats.transactions, 0);
    }

    #[tokio::test]
    async fn delete_goes_through_the_ledger() {
        let app = app("delete");
        send(
            &app.router,
            json("POST", "/api/create", r#"{"id":"T1","price":100,"day":5,"seat":"A1"}"#),
        )
        .await;
        let (status, body) = send(&app.router, json("POST", "/api/delete", r#"{"id":"T1"}"#)).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (_, body) = send(&app.router, get("/api/ticketHistory/T1")).await;
        let history: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[1]["IsDelete"], "true");

        let (status, body) = send(&app.router, get("/api/ticket/T1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("QueryError: "));
    }
}

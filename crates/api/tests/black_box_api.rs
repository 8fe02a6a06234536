use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use saldo_core::AccountId;
use saldo_store::InMemoryLedger;

struct TestServer {
    base_url: String,
    ledger: Arc<InMemoryLedger>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, over the in-memory ledger, on an ephemeral port.
        let ledger = Arc::new(InMemoryLedger::new());
        let app = saldo_api::app::build_app(ledger.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            ledger,
            handle,
        }
    }

    async fn seed_account(&self, id: i64, balance: i64, limit: i64) {
        self.ledger
            .insert_account(AccountId::new(id).unwrap(), balance, limit)
            .await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post_movement(
    client: &reqwest::Client,
    base_url: &str,
    id: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(format!("{}/accounts/{}/movements", base_url, id))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn get_statement(
    client: &reqwest::Client,
    base_url: &str,
    id: &str,
) -> reqwest::Response {
    client
        .get(format!("{}/accounts/{}/statement", base_url, id))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn rent_tax_pay_scenario() {
    let srv = TestServer::spawn().await;
    srv.seed_account(1, 0, 1000).await;
    let client = reqwest::Client::new();

    let res = post_movement(
        &client,
        &srv.base_url,
        "1",
        json!({"value": 1000, "kind": "debit", "description": "rent"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["balance"], -1000);
    assert_eq!(body["limit"], 1000);

    // One unit below the floor: rejected, balance untouched.
    let res = post_movement(
        &client,
        &srv.base_url,
        "1",
        json!({"value": 1, "kind": "debit", "description": "tax"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = post_movement(
        &client,
        &srv.base_url,
        "1",
        json!({"value": 500, "kind": "credit", "description": "pay"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["balance"], -500);
    assert_eq!(body["limit"], 1000);
}

#[tokio::test]
async fn malformed_ids_and_unknown_accounts_are_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = get_statement(&client, &srv.base_url, "999999").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    for bad_id in ["abc", "0", "-3", "1.5"] {
        let res = get_statement(&client, &srv.base_url, bad_id).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "id {bad_id:?}");

        let res = post_movement(
            &client,
            &srv.base_url,
            bad_id,
            json!({"value": 1, "kind": "credit", "description": "x"}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "id {bad_id:?}");
    }
}

#[tokio::test]
async fn invalid_bodies_are_422() {
    let srv = TestServer::spawn().await;
    srv.seed_account(1, 0, 1000).await;
    let client = reqwest::Client::new();

    let cases = [
        json!({"value": 0, "kind": "debit", "description": "x"}),
        json!({"value": -5, "kind": "debit", "description": "x"}),
        json!({"value": 1.2, "kind": "debit", "description": "x"}),
        json!({"value": 1, "kind": "x", "description": "x"}),
        json!({"value": 1, "kind": "debit", "description": ""}),
        json!({"value": 1, "kind": "debit", "description": "elevenchars"}),
        json!({"value": 1, "kind": "debit"}),
    ];

    for body in cases {
        let res = post_movement(&client, &srv.base_url, "1", body.clone()).await;
        assert_eq!(
            res.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "body {body}"
        );
    }

    // Rejections never reached the engine.
    let res = get_statement(&client, &srv.base_url, "1").await;
    let statement: serde_json::Value = res.json().await.unwrap();
    assert_eq!(statement["balance"]["total"], 0);
    assert_eq!(statement["recent_movements"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn description_boundaries_over_http() {
    let srv = TestServer::spawn().await;
    srv.seed_account(1, 0, 0).await;
    let client = reqwest::Client::new();

    let res = post_movement(
        &client,
        &srv.base_url,
        "1",
        json!({"value": 1, "kind": "credit", "description": "abcdefghij"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = post_movement(
        &client,
        &srv.base_url,
        "1",
        json!({"value": 1, "kind": "credit", "description": "abcdefghijk"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn statement_shape_cap_and_ordering() {
    let srv = TestServer::spawn().await;
    srv.seed_account(7, 0, 0).await;
    let client = reqwest::Client::new();

    for i in 1..=15 {
        let res = post_movement(
            &client,
            &srv.base_url,
            "7",
            json!({"value": i, "kind": "credit", "description": format!("m{i}")}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = get_statement(&client, &srv.base_url, "7").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["balance"]["total"], 120); // 1 + 2 + ... + 15
    assert_eq!(body["balance"]["limit"], 0);

    // Fixed timestamp shape: RFC 3339 UTC with exactly six fractional digits.
    let snapshot = body["balance"]["snapshot_time"].as_str().unwrap();
    chrono::DateTime::parse_from_rfc3339(snapshot).unwrap();
    let fractional = snapshot
        .rsplit_once('.')
        .map(|(_, rest)| rest.trim_end_matches('Z'))
        .unwrap();
    assert_eq!(fractional.len(), 6, "snapshot_time {snapshot:?}");

    let movements = body["recent_movements"].as_array().unwrap();
    assert_eq!(movements.len(), 10);
    let descriptions: Vec<&str> = movements
        .iter()
        .map(|m| m["description"].as_str().unwrap())
        .collect();
    let expected: Vec<String> = (6..=15).rev().map(|i| format!("m{i}")).collect();
    assert_eq!(descriptions, expected);

    for movement in movements {
        assert!(movement["value"].is_i64());
        assert!(matches!(
            movement["kind"].as_str().unwrap(),
            "credit" | "debit"
        ));
        chrono::DateTime::parse_from_rfc3339(movement["occurred_at"].as_str().unwrap()).unwrap();
    }
}

use axum_test::TestServer;
use ledger_core::{Difficulty, Ledger};
use ledger_node::api::{router, AppState};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

fn server_with(target_bits: u32, timeout: Duration) -> (TestServer, Arc<Ledger>) {
    let ledger = Arc::new(Ledger::new(Difficulty::new(target_bits).unwrap()));
    let app = router(AppState::new(Arc::clone(&ledger), timeout));
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, ledger)
}

fn server() -> (TestServer, Arc<Ledger>) {
    server_with(8, Duration::from_secs(30))
}

#[tokio::test]
async fn get_returns_genesis_chain() {
    let (server, _ledger) = server();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    let chain: Value = response.json();
    let blocks = chain.as_array().expect("chain is an array");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["Index"], 0);
    assert_eq!(blocks[0]["Hash"], "");
    assert_eq!(blocks[0]["PrevHash"], "");
    assert_eq!(blocks[0]["Nonce"], 0);
}

#[tokio::test]
async fn post_mines_and_appends_block() {
    let (server, ledger) = server();

    let response = server.post("/").json(&json!({ "BPM": 70 })).await;
    assert_eq!(response.status_code(), 201);
    let block: Value = response.json();
    assert_eq!(block["Index"], 1);
    assert_eq!(block["BPM"], 70);
    assert_eq!(block["PrevHash"], "");
    assert!(block["Hash"].as_str().unwrap().starts_with("00"));

    let chain: Value = server.get("/").await.json();
    assert_eq!(chain.as_array().unwrap().len(), 2);
    assert_eq!(chain[1], block);
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn lowercase_field_is_accepted() {
    let (server, _ledger) = server();

    let response = server.post("/").json(&json!({ "bpm": 64 })).await;
    assert_eq!(response.status_code(), 201);
    let block: Value = response.json();
    assert_eq!(block["BPM"], 64);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let (server, ledger) = server();

    let response = server
        .post("/")
        .json(&json!({ "BPM": "seventy" }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("malformed request"));

    let response = server
        .post("/")
        .text("{\"BPM\": ")
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);

    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn slow_mining_times_out() {
    // 40 bits is far beyond what can be found in 50ms.
    let (server, ledger) = server_with(40, Duration::from_millis(50));

    let response = server
        .post("/")
        .json(&json!({ "BPM": 70 }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 503);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn health_endpoint() {
    let (server, _ledger) = server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "ok");
}

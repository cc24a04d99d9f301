//! End-to-end HTTP tests against a real Redis instance and a real in-process
//! server. Ignored by default — run with `cargo test -- --ignored` against a
//! Redis at `REDIS_URL` (defaults to `redis://127.0.0.1:6379`).

use reqwest::Client;
use serde_json::json;

use throttler::config::{BucketLimit, Config};
use throttler::server::create_app;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn spawn_server(config: Config) -> String {
    let app = create_app(config).await.expect("failed to build app");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn unique_key(prefix: &str) -> String {
    format!("{prefix}:{}", std::process::id())
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn charges_deplete_and_reject_when_exhausted() {
    let mut config = Config::default();
    config.redis_url = redis_url();
    config
        .custom_limits
        .insert("strict".to_string(), BucketLimit { rate: 0.0, size: 1.0 });

    let base_url = spawn_server(config).await;
    let client = Client::new();
    let key = unique_key("strict");

    let resp = client
        .post(format!("{base_url}/buckets/{key}/charge"))
        .json(&json!({"amount": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base_url}/buckets/{key}/charge"))
        .json(&json!({"amount": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["level"], 0.0);
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn batch_charge_is_all_or_nothing() {
    let mut config = Config::default();
    config.redis_url = redis_url();
    config
        .custom_limits
        .insert("batch".to_string(), BucketLimit { rate: 1.0, size: 5.0 });

    let base_url = spawn_server(config).await;
    let client = Client::new();
    let a = unique_key("batch-a");
    let b = unique_key("batch-b");

    // drain `a` down to 0 first
    client
        .post(format!("{base_url}/buckets/{a}/charge"))
        .json(&json!({"amount": 5.0}))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/batch-charge"))
        .json(&json!({"requests": [
            {"key": a, "amount": 1.0},
            {"key": b, "amount": 1.0},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);

    // `b` must be untouched since the batch rejected as a whole
    let resp = client.get(format!("{base_url}/buckets/{b}")).send().await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["level"], 5.0);
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn health_and_ready_report_ok() {
    let mut config = Config::default();
    config.redis_url = redis_url();
    let base_url = spawn_server(config).await;
    let client = Client::new();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let resp = client.get(format!("{base_url}/ready")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

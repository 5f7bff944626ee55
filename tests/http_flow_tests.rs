//! Upload, evaluate and poll over a real socket.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use appraisal::gateway::{HandlerState, create_router_with_state};
use appraisal::queue::QueueConfig;
use appraisal::scoring::MockScorer;
use common::{REFERENCE_TEXT, SUBJECT_TEXT, TestStack, build_stack, fast_pipeline_config};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    stack: TestStack,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn spawn_server() -> TestServer {
    let stack = build_stack(
        Arc::new(MockScorer::new(0.8, 4.0)),
        QueueConfig {
            worker_count: 2,
            capacity: 10,
            enqueue_timeout: Duration::from_secs(1),
        },
        fast_pipeline_config(),
    )
    .await;
    stack.queue.start().await.unwrap();

    let app = create_router_with_state(HandlerState::new(Arc::clone(&stack.service)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        addr,
        stack,
        shutdown_tx: Some(shutdown_tx),
    }
}

async fn upload(client: &reqwest::Client, server: &TestServer, role: &str, name: &str, text: &str) -> String {
    let response = client
        .post(server.url(&format!("/upload?role={role}&filename={name}")))
        .body(text.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], role);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_upload_evaluate_and_fetch_result() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let subject_id = upload(&client, &server, "subject", "cv.txt", SUBJECT_TEXT).await;
    let reference_id = upload(&client, &server, "reference", "report.md", REFERENCE_TEXT).await;

    let response = client
        .post(server.url("/evaluate"))
        .json(&json!({
            "title": "Backend Engineer",
            "subject_id": subject_id,
            "reference_id": reference_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let accepted: Value = response.json().await.unwrap();
    assert_eq!(accepted["status"], "queued");
    let job_id = accepted["id"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..200 {
        last = client
            .get(server.url(&format!("/result/{job_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if last["status"] == "completed" || last["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    assert_eq!(last["status"], "completed", "final body: {last}");
    assert_eq!(last["result"]["match_rate"], 0.8);
    assert_eq!(last["result"]["reference_score"], 4.0);
    assert!(last.get("error").is_none());

    server.stack.queue.stop().await;
}

#[tokio::test]
async fn test_evaluate_with_unknown_document_is_not_found() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let subject_id = upload(&client, &server, "subject", "cv.txt", SUBJECT_TEXT).await;

    let response = client
        .post(server.url("/evaluate"))
        .json(&json!({
            "title": "Backend Engineer",
            "subject_id": subject_id,
            "reference_id": uuid::Uuid::new_v4().to_string(),
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);

    server.stack.queue.stop().await;
}

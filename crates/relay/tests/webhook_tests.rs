//! Webhook endpoint tests: the sender always sees success, whatever happens
//! inside the relay.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;

use firehose::{
    ChannelRouter, Dispatcher, Notifier, ObjectKind, OutboundMessage, Severity, Transaction,
    TransactionSource, UserDirectory,
};
use relay::server::{build_router, AppState};

// =============================================================================
// Mock collaborators
// =============================================================================

/// Tracker stub whose every call fails.
struct FailingSource;

#[async_trait]
impl TransactionSource for FailingSource {
    async fn transactions(
        &self,
        _kind: ObjectKind,
        _object_phid: &str,
        _tx_phids: &[String],
    ) -> Result<Vec<Transaction>> {
        Err(anyhow!("conduit unreachable"))
    }

    async fn link(&self, _phid: &str) -> Result<String> {
        Err(anyhow!("conduit unreachable"))
    }

    async fn owner(&self, _phid: &str) -> Result<Option<String>> {
        Err(anyhow!("conduit unreachable"))
    }
}

/// Notifier that records every message it is handed.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: OutboundMessage) {
        self.sent.lock().unwrap().push(message);
    }
}

// =============================================================================
// Harness
// =============================================================================

fn dispatcher(source: Arc<dyn TransactionSource>) -> (Arc<Dispatcher>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let router = Arc::new(
        ChannelRouter::new(HashMap::from([(
            "__default__".to_string(),
            "#general".to_string(),
        )]))
        .unwrap(),
    );
    let dispatcher = Arc::new(Dispatcher::new(
        source,
        notifier.clone(),
        Arc::new(UserDirectory::default()),
        router,
    ));
    (dispatcher, notifier)
}

/// Serve the relay router on a random port.
async fn serve(dispatcher: Arc<Dispatcher>) -> SocketAddr {
    let app = build_router(AppState { dispatcher });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Wait for the server to be ready
    tokio::time::sleep(Duration::from_millis(100)).await;

    addr
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn health_endpoint_answers() {
    let (dispatcher, _notifier) = dispatcher(Arc::new(FailingSource));
    let addr = serve(dispatcher).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn unknown_events_are_acknowledged() {
    let (dispatcher, notifier) = dispatcher(Arc::new(FailingSource));
    let addr = serve(dispatcher).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/firehose"))
        .json(&json!({
            "object": {"type": "WIKI", "phid": "PHID-WIKI-1"},
            "transactions": [{"phid": "PHID-XACT-1"}],
        }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // No debug sink configured: nothing is sent.
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn internal_failures_still_answer_success() {
    let (dispatcher, notifier) = dispatcher(Arc::new(FailingSource));
    let addr = serve(dispatcher).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/firehose"))
        .json(&json!({
            "object": {"type": "TASK", "phid": "PHID-TASK-1"},
            "transactions": [{"phid": "PHID-XACT-1"}],
        }))
        .send()
        .await
        .unwrap();

    // The sender sees success; the failure goes out as an error report.
    assert!(response.status().is_success());
    let sent = notifier.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].severity, Severity::Error);
    assert!(sent[0].text.contains("conduit unreachable"));
}

#[tokio::test]
async fn non_json_bodies_are_rejected_at_the_boundary() {
    let (dispatcher, _notifier) = dispatcher(Arc::new(FailingSource));
    let addr = serve(dispatcher).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/firehose"))
        .body("not json")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

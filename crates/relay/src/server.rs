//! HTTP server for the firehose webhook.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use firehose::Dispatcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The request dispatcher.
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the HTTP router for the relay service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/firehose", post(firehose_webhook))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle one firehose webhook call.
///
/// Always answers success: internal failures are reported through the chat
/// notifier, never to the webhook sender, so the tracker does not retry.
async fn firehose_webhook(State(state): State<AppState>, Json(payload): Json<Value>) -> Json<Value> {
    debug!("Received firehose webhook");
    state.dispatcher.handle(&payload).await;
    Json(json!({"status": "ok"}))
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

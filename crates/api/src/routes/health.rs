//! Health check endpoint.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router<S, P>() -> Router<AppState<S, P>>
where
    S: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "relay-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

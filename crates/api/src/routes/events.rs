//! Record-created invocation endpoint.
//!
//! For hosting platforms that deliver change events over HTTP. The handler
//! runs the pipeline once and always answers 200 with the outcome, so a
//! benign skip never causes the platform to re-invoke.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use relay_common::types::{DispatchOutcome, RecordCreated};
use relay_engine::{ProfileStore, PushSender};

use crate::state::AppState;

pub fn router<S, P>() -> Router<AppState<S, P>>
where
    S: ProfileStore + 'static,
    P: PushSender + 'static,
{
    Router::new().route(
        "/api/events/notification-created",
        post(notification_created::<S, P>),
    )
}

/// POST /api/events/notification-created — Dispatch a newly created record.
async fn notification_created<S, P>(
    State(state): State<AppState<S, P>>,
    Json(event): Json<RecordCreated>,
) -> Json<DispatchOutcome>
where
    S: ProfileStore + 'static,
    P: PushSender + 'static,
{
    Json(state.pipeline.dispatch(&event).await)
}

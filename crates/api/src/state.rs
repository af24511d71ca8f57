//! Shared application state for the Axum API server.

use std::sync::Arc;

use relay_engine::DispatchPipeline;

/// Application state shared across all route handlers via Axum `State`.
pub struct AppState<S, P> {
    pub pipeline: Arc<DispatchPipeline<S, P>>,
}

impl<S, P> AppState<S, P> {
    pub fn new(pipeline: DispatchPipeline<S, P>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl<S, P> Clone for AppState<S, P> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

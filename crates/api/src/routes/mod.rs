pub mod events;
pub mod health;

use axum::Router;

use relay_engine::{ProfileStore, PushSender};

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router<S, P>(state: AppState<S, P>) -> Router
where
    S: ProfileStore + 'static,
    P: PushSender + 'static,
{
    Router::new()
        .merge(health::router::<S, P>())
        .merge(events::router::<S, P>())
        .with_state(state)
}

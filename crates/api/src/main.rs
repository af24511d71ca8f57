//! PushRelay HTTP invocation surface.

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use relay_common::config::AppConfig;
use relay_common::db::create_pool;
use relay_engine::DispatchPipeline;
use relay_engine::store::PgProfileStore;
use relay_notifier::{FcmClient, FcmConfig};

use relay_api::routes::create_router;
use relay_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("relay_api=debug,relay_engine=debug,relay_notifier=info,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting PushRelay API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    let sender = FcmClient::new(FcmConfig::from_app_config(&config)?)?;

    // Build application state
    let state = AppState::new(DispatchPipeline::new(
        PgProfileStore::new(pool),
        sender,
        config.message_defaults(),
    ));

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config
        .api_bind_addr
        .parse()
        .map_err(|_| anyhow::anyhow!("API_BIND_ADDR must be a socket address"))?;
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

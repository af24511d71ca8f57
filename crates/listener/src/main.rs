use std::sync::Arc;

use relay_common::config::AppConfig;
use relay_common::db;
use relay_engine::DispatchPipeline;
use relay_engine::store::PgProfileStore;
use relay_listener::listener::ChangeListener;
use relay_notifier::{FcmClient, FcmConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_listener=info,relay_engine=info,relay_notifier=info".into()),
        )
        .json()
        .init();

    tracing::info!("PushRelay listener starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let sender = FcmClient::new(FcmConfig::from_app_config(&config)?)?;
    let pipeline = Arc::new(DispatchPipeline::new(
        PgProfileStore::new(pool.clone()),
        sender,
        config.message_defaults(),
    ));

    let mut listener = ChangeListener::connect(&pool, pipeline).await?;

    // Run with graceful shutdown on Ctrl+C
    let result = tokio::select! {
        result = listener.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
            Ok(())
        }
    };

    // Let dispatches already underway reach their terminal outcome
    let finished = listener.drain().await;
    tracing::info!(finished = finished.len(), "In-flight dispatches completed");

    if let Err(e) = result {
        tracing::error!(error = %e, "Change listener exited with error");
        return Err(e.into());
    }

    tracing::info!("PushRelay listener stopped.");
    Ok(())
}

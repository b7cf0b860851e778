use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tiffin::{router, AppState, Config, PgStore, TokenService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load();

    let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
    store.migrate().await?;
    let store = Arc::new(store);

    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl_hours);
    let state = AppState::new(Arc::clone(&store), tokens);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain the pool before exiting.
    store.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("shutdown signal received");
}

use std::sync::Arc;

use pet_courier::api;
use pet_courier::config::Config;
use pet_courier::error::AppError;
use pet_courier::persistence::FileSlot;
use pet_courier::state::DeliveryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let slot = FileSlot::new(&config.snapshot_dir, &config.snapshot_key);
    tracing::info!(snapshot = %slot.path().display(), "opening delivery store");
    let store = Arc::new(DeliveryStore::open(
        Box::new(slot),
        config.event_buffer_size,
    ));

    let app = api::rest::router(store);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

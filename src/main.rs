use hundred_days::{AppConfig, AppState, MemoryStore, RemoteStore, router};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let remote: Arc<dyn RemoteStore> = match &config.remote_store_path {
        Some(path) => Arc::new(MemoryStore::open(path).await?),
        None => Arc::new(MemoryStore::new()),
    };
    info!(
        data_path = %config.data_path.display(),
        default_start = %config.default_start,
        "challenge storage ready"
    );

    let app = router(AppState::new(&config, remote));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

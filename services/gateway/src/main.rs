use std::sync::Arc;

use clap::Parser;
use feed::HttpFeedSource;
use gateway::clock::SystemClock;
use gateway::config::Config;
use gateway::resolver::{GeoResolver, NominatimResolver, NoopResolver};
use gateway::{AppState, TrackerService, create_router};
use persistence::open_store;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(storage = ?config.storage, feed = %config.feed_url, "Starting ISS tracker");

    let store = open_store(&config.storage_config())?;
    let feed = Arc::new(HttpFeedSource::new(config.feed_url.clone(), config.feed_timeout())?);
    let resolver: Arc<dyn GeoResolver> = if config.geocoder_url.is_empty() {
        tracing::info!("Reverse geocoding disabled");
        Arc::new(NoopResolver)
    } else {
        Arc::new(NominatimResolver::new(
            config.geocoder_url.clone(),
            config.geocoder_timeout(),
        )?)
    };

    let service = Arc::new(TrackerService::new(store, feed, resolver, Arc::new(SystemClock)));
    service.warm_up().await;

    let app = create_router(AppState::new(service));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use common::database::{DatabaseConfig, init_pool};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use video_api::{
    AppState,
    config::{ApiConfig, StoreBackend},
    middleware::cors_layer,
    rate_limiter::RateLimiter,
    repositories::{MemoryVideoStore, PgVideoStore, SharedVideoStore},
    routes,
    service::VideoService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    info!("Starting video API service");

    // Initialize storage
    let (store, pool) = match config.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;
            let store = PgVideoStore::new(pool.clone());
            store.migrate().await?;
            let store: SharedVideoStore = Arc::new(store);
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory video store; data is lost on shutdown");
            let store: SharedVideoStore = Arc::new(MemoryVideoStore::new());
            (store, None)
        }
    };

    // Check storage connectivity
    if store.health_check().await? {
        info!("Video store connection successful");
    } else {
        anyhow::bail!("Failed to connect to video store");
    }

    let mut app_state = AppState::new(VideoService::new(store));
    match config.rate_limiter_config() {
        Some(limits) => {
            info!(
                "Rate limiting to {} requests per {}s per client",
                limits.max_requests,
                limits.window.as_secs()
            );
            app_state = app_state.with_rate_limiter(RateLimiter::new(limits));
        }
        None => info!("Rate limiting disabled"),
    }

    // Start the web server
    let app = routes::create_router(app_state).layer(cors_layer(&config)?);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Video API service listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database connection pool closed");
    }

    info!("Video API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

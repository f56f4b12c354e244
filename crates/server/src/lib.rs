pub mod api;
pub mod banner;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa_scalar::{Scalar, Servable};

pub use api::create_router;
pub use banner::print_banner;
pub use config::{Config, Environment};
pub use db::create_pool;
pub use error::{AppError, AppResult};
pub use state::AppState;

use crate::repositories::QueueRepository;

pub async fn run_server(
    addr: SocketAddr,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    // Ensure data directories exist
    std::fs::create_dir_all(&config.data_path)?;
    std::fs::create_dir_all(config.media_path())?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;

    // A previous process may have died mid-download; those claims can never
    // complete, so hand them back to the queue before anything starts.
    let recovered = QueueRepository::reset_active(&pool).await?;
    if recovered > 0 {
        tracing::info!("Recovered {} interrupted downloads", recovered);
    }

    let shutdown = CancellationToken::new();
    let media_path = config.media_path();
    let shutdown_grace = config.shutdown_grace();
    let state = AppState::new(pool, config, shutdown.clone());
    let downloads = state.downloads.clone();

    let (router, api) = create_router(state);

    // Serve downloaded media straight from the data directory
    let app = router
        .nest_service("/media", ServeDir::new(&media_path))
        .merge(Scalar::with_url("/docs", api))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scheduler loops, then give in-flight downloads their grace
    tracing::info!("Shutting down");
    shutdown.cancel();
    downloads.shutdown(shutdown_grace).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

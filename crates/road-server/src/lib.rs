//! # road-server
//!
//! The Roadtrack HTTP API.
//!
//! An axum router over [`road_db::service::RoadService`]. Every `/api` route
//! except login requires a bearer JWT and checks one
//! [`road_auth::Permission`]. Mutations that other users care about are
//! pushed to open event streams through the shared
//! [`road_realtime::ConnectionRegistry`].
//!
//! The `roadtrack` binary in this crate wraps the router with configuration
//! loading, tracing setup, and graceful shutdown.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;

/// Resolves when the process receives Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use road_config::RoadConfig;
use road_db::service::RoadService;
use road_server::{AppState, build_router, shutdown_signal};

use crate::cli::ServeArgs;

pub async fn handle(args: &ServeArgs, mut config: RoadConfig) -> anyhow::Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind.clone_from(bind);
    }
    config
        .validate_for_serve()
        .context("configuration is not complete enough to serve (set ROADTRACK_AUTH__JWT_SECRET)")?;

    let service = RoadService::from_config(&config.database)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
    if service.count_users().await? == 0 {
        tracing::warn!("no users exist yet; create one with `roadtrack user create --role admin`");
    }

    let bind = config.server.bind.clone();
    let state = AppState::new(service, config);
    let registry = Arc::clone(&state.registry);
    let router = build_router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, "roadtrack listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open event streams never finish on their own.
            let closed = registry.drain();
            tracing::info!(closed, "event streams closed");
        })
        .await
        .context("server error")?;

    tracing::info!("roadtrack stopped");
    Ok(())
}

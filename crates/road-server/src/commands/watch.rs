use road_config::RoadConfig;
use road_core::events::EventKind;
use road_realtime::{ClientConfig, ConnectionState, RealtimeClient, SseTransport};
use road_server::shutdown_signal;

use crate::cli::WatchArgs;

/// Follow the event stream until interrupted. Events go to stdout, one JSON
/// object per line; connection state changes go to the log.
pub async fn handle(args: &WatchArgs, config: &RoadConfig) -> anyhow::Result<()> {
    let mut transport = SseTransport::new(&args.url).with_token(args.token.clone());
    if let Some(project) = &args.project {
        transport = transport.for_project(project.clone());
    }

    let heartbeats = args.heartbeats;
    let handle = RealtimeClient::new(transport, ClientConfig::from_realtime(&config.realtime))
        .on_all(move |event| {
            if event.kind == EventKind::Heartbeat && !heartbeats {
                return;
            }
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "event not printable"),
            }
        })
        .spawn();

    let mut states = handle.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                match states.borrow_and_update().clone() {
                    ConnectionState::Error(reason) => {
                        tracing::warn!(%reason, attempts = handle.attempts(), "stream lost; retrying");
                    }
                    state => tracing::info!(?state, "stream state"),
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

//! The SSE event stream and the connection status view.
//!
//! Each stream registers with the shared [`ConnectionRegistry`]; the
//! registry's heartbeat task keeps it alive and dropping the response
//! unregisters it.
//!
//! [`ConnectionRegistry`]: road_realtime::ConnectionRegistry

use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use road_auth::{Permission, authorize};
use road_realtime::ConnectionInfo;
use road_realtime::transport::EVENTS_PATH;

use super::non_blank;
use crate::error::ApiError;
use crate::extract::{ApiQuery, AuthUser, authenticate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(EVENTS_PATH, get(events))
        .route("/api/realtime/status", get(status))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    project_id: Option<String>,
    /// Browsers cannot set headers on `EventSource`, so the token may ride
    /// in the query string.
    token: Option<String>,
}

async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let identity = authenticate(&state, &headers, query.token.as_deref()).await?;
    authorize(identity.role, Permission::View)?;

    let project_id = non_blank(query.project_id);
    let stream = state
        .registry
        .connect(&identity.user_id, identity.role, project_id.clone());
    tracing::info!(
        connection_id = stream.id(),
        user_id = %identity.user_id,
        ?project_id,
        "event stream opened"
    );

    Ok(Sse::new(
        stream.map(|frame| Ok(Event::default().data(frame))),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeStatus {
    connections: usize,
    heartbeat_interval_secs: u64,
    items: Vec<ConnectionInfo>,
}

async fn status(State(state): State<AppState>, user: AuthUser) -> Result<Json<RealtimeStatus>, ApiError> {
    user.require(Permission::Administer)?;
    let items = state.registry.snapshot();
    Ok(Json(RealtimeStatus {
        connections: items.len(),
        heartbeat_interval_secs: state.registry.heartbeat_interval().as_secs(),
        items,
    }))
}

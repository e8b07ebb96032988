//! Route table. One module per resource; each exposes `router()`.

mod activity;
mod auth;
mod construction;
mod contractors;
mod funding;
mod gps;
mod incidents;
mod milestones;
mod navigation;
mod projects;
mod provinces;
mod realtime;
mod reports;
mod settings;
mod uploads;
mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let upload_path = state.config.server.upload_base_path.clone();
    let upload_dir = state.config.uploads.dir.clone();

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(provinces::router())
        .merge(projects::router())
        .merge(contractors::router())
        .merge(gps::router())
        .merge(construction::router())
        .merge(milestones::router())
        .merge(funding::router())
        .merge(incidents::router())
        .merge(reports::router())
        .merge(settings::router())
        .merge(navigation::router())
        .merge(activity::router())
        .merge(uploads::router(&state.config.uploads))
        .merge(realtime::router())
        .nest_service(&upload_path, ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "connections": state.registry.len(),
    }))
}

/// `201 Created` with the new record as the body.
pub(crate) fn created<T: Serialize>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

/// Body returned by every delete endpoint.
pub(crate) fn deleted(id: &str) -> Json<serde_json::Value> {
    Json(json!({ "id": id, "deleted": true }))
}

/// `?project_id=` filter shared by the per-project listings.
#[derive(Debug, Deserialize)]
pub(crate) struct ProjectQuery {
    pub project_id: Option<String>,
}

/// Treat an empty query value as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

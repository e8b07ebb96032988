//! HSE incidents. Reporting one pushes a notification to the project's
//! subscribers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use road_auth::Permission;
use road_core::entities::{HseIncident, NewIncident};
use road_core::enums::IncidentStatus;
use road_core::events::{EventKind, RealtimeEvent};
use road_db::repos::incident::IncidentFilter;
use road_db::updates::incident::IncidentUpdate;

use super::{created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/incidents", get(list).post(create))
        .route("/api/incidents/{id}", get(fetch).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    project_id: Option<String>,
    status: Option<IncidentStatus>,
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<HseIncident>>, ApiError> {
    user.require(Permission::View)?;
    let filter = IncidentFilter {
        project_id: non_blank(query.project_id),
        status: query.status,
    };
    Ok(Json(state.service.list_incidents(&filter).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<HseIncident>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_incident(&id).await?))
}

fn incident_notification(incident: &HseIncident) -> RealtimeEvent {
    RealtimeEvent::new(
        EventKind::Notification,
        json!({
            "title": format!("{} severity HSE incident reported", incident.severity),
            "message": incident.title,
            "severity": incident.severity,
            "incidentId": incident.id,
        }),
    )
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewIncident>,
) -> Result<(StatusCode, Json<HseIncident>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    let incident = state.service.create_incident(user.actor(), &new).await?;
    state.publish(incident_notification(&incident), Some(&incident.project_id));
    Ok(created(incident))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<IncidentUpdate>,
) -> Result<Json<HseIncident>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    Ok(Json(
        state.service.update_incident(user.actor(), &id, update).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_incident(user.actor(), &id).await?;
    Ok(deleted(&id))
}

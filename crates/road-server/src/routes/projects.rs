//! Projects, their road sections, contractor assignments, statistics, and
//! GPS point CSV exchange.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use road_auth::Permission;
use road_core::entities::{
    AssignContractor, Contractor, NewProject, NewSection, Project, ProjectContractor,
    ProjectStats, RoadSection,
};
use road_core::enums::ProjectStatus;
use road_core::events::EventKind;
use road_db::repos::project::ProjectFilter;
use road_db::updates::project::ProjectUpdate;

use super::{created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list).post(create))
        .route("/api/projects/{id}", get(fetch).put(update).delete(remove))
        .route("/api/projects/{id}/stats", get(stats))
        .route(
            "/api/projects/{id}/sections",
            get(list_sections).post(create_section),
        )
        .route("/api/sections/{id}", delete(remove_section))
        .route(
            "/api/projects/{id}/contractors",
            get(list_contractors).post(assign_contractor),
        )
        .route(
            "/api/projects/{id}/contractors/{contractor_id}",
            delete(unassign_contractor),
        )
        .route("/api/projects/{id}/gps-points/export", get(export_gps))
        .route("/api/projects/{id}/gps-points/import", post(import_gps))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    province_id: Option<String>,
    status: Option<ProjectStatus>,
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    user.require(Permission::View)?;
    let filter = ProjectFilter {
        province_id: non_blank(query.province_id),
        status: query.status,
    };
    Ok(Json(state.service.list_projects(&filter).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_project(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    user.require(Permission::ManageProjects)?;
    let project = state.service.create_project(user.actor(), &new).await?;
    state.publish_payload(EventKind::ProjectUpdate, &project, None);
    Ok(created(project))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    user.require(Permission::ManageProjects)?;
    let project = state.service.update_project(user.actor(), &id, update).await?;
    state.publish_payload(EventKind::ProjectUpdate, &project, Some(&project.id));
    Ok(Json(project))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_project(user.actor(), &id).await?;
    Ok(deleted(&id))
}

async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectStats>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.project_stats(&id).await?))
}

// -- sections --

async fn list_sections(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoadSection>>, ApiError> {
    user.require(Permission::View)?;
    state.service.get_project(&id).await?;
    Ok(Json(state.service.list_sections(&id).await?))
}

async fn create_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(new): ApiJson<NewSection>,
) -> Result<(StatusCode, Json<RoadSection>), ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(created(
        state.service.create_section(user.actor(), &id, &new).await?,
    ))
}

async fn remove_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_section(user.actor(), &id).await?;
    Ok(deleted(&id))
}

// -- contractor assignments --

#[derive(Debug, Serialize)]
struct AssignedContractor {
    #[serde(flatten)]
    contractor: Contractor,
    contract_role: Option<String>,
    assigned_at: chrono::DateTime<chrono::Utc>,
}

async fn list_contractors(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<AssignedContractor>>, ApiError> {
    user.require(Permission::View)?;
    state.service.get_project(&id).await?;
    let assigned = state
        .service
        .list_project_contractors(&id)
        .await?
        .into_iter()
        .map(|(contractor, assignment)| AssignedContractor {
            contractor,
            contract_role: assignment.contract_role,
            assigned_at: assignment.assigned_at,
        })
        .collect();
    Ok(Json(assigned))
}

async fn assign_contractor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(assignment): ApiJson<AssignContractor>,
) -> Result<(StatusCode, Json<ProjectContractor>), ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(created(
        state
            .service
            .assign_contractor(user.actor(), &id, &assignment)
            .await?,
    ))
}

async fn unassign_contractor(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, contractor_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state
        .service
        .unassign_contractor(user.actor(), &id, &contractor_id)
        .await?;
    Ok(deleted(&contractor_id))
}

// -- GPS CSV --

async fn export_gps(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(Permission::View)?;
    let body = state.service.export_gps_csv(&id).await?;
    let disposition = format!("attachment; filename=\"{id}-gps-points.csv\"");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn import_gps(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    let report = state.service.import_gps_csv(user.actor(), &id, &body).await?;
    for point in &report.imported {
        state.publish_payload(EventKind::GpsPointAdded, point, Some(&id));
    }
    Ok(Json(json!({
        "imported": report.imported_count(),
        "failed": report.failed_count(),
        "errors": report.failed,
        "points": report.imported,
    })))
}

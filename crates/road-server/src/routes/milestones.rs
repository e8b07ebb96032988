use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{NewMilestone, ProjectMilestone};
use road_db::updates::milestone::MilestoneUpdate;

use super::{ProjectQuery, created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/milestones", get(list).post(create))
        .route("/api/milestones/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<ProjectMilestone>>, ApiError> {
    user.require(Permission::View)?;
    let project_id = non_blank(query.project_id);
    Ok(Json(
        state.service.list_milestones(project_id.as_deref()).await?,
    ))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectMilestone>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_milestone(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewMilestone>,
) -> Result<(StatusCode, Json<ProjectMilestone>), ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(created(state.service.create_milestone(user.actor(), &new).await?))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<MilestoneUpdate>,
) -> Result<Json<ProjectMilestone>, ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(Json(
        state.service.update_milestone(user.actor(), &id, update).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_milestone(user.actor(), &id).await?;
    Ok(deleted(&id))
}

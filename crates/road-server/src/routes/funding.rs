use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{NewFunding, ProjectFunding};
use road_db::updates::funding::FundingUpdate;

use super::{ProjectQuery, created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/funding", get(list).post(create))
        .route("/api/funding/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<ProjectFunding>>, ApiError> {
    user.require(Permission::View)?;
    let project_id = non_blank(query.project_id);
    Ok(Json(state.service.list_funding(project_id.as_deref()).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectFunding>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_funding(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewFunding>,
) -> Result<(StatusCode, Json<ProjectFunding>), ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(created(state.service.create_funding(user.actor(), &new).await?))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<FundingUpdate>,
) -> Result<Json<ProjectFunding>, ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(Json(
        state.service.update_funding(user.actor(), &id, update).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_funding(user.actor(), &id).await?;
    Ok(deleted(&id))
}

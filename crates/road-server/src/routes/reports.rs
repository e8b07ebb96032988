use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{NewProgressReport, ProgressReport};

use super::{ProjectQuery, created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports", get(list).post(create))
        .route("/api/reports/{id}", get(fetch).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<ProgressReport>>, ApiError> {
    user.require(Permission::View)?;
    let project_id = non_blank(query.project_id);
    Ok(Json(state.service.list_reports(project_id.as_deref()).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProgressReport>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_report(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewProgressReport>,
) -> Result<(StatusCode, Json<ProgressReport>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    Ok(created(state.service.create_report(user.actor(), &new).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    state.service.delete_report(user.actor(), &id).await?;
    Ok(deleted(&id))
}

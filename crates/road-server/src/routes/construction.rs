use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{ConstructionActivity, NewConstructionActivity};
use road_core::events::EventKind;
use road_db::updates::construction::ConstructionActivityUpdate;

use super::{ProjectQuery, created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/construction-activities", get(list).post(create))
        .route(
            "/api/construction-activities/{id}",
            get(fetch).put(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<ConstructionActivity>>, ApiError> {
    user.require(Permission::View)?;
    let project_id = non_blank(query.project_id);
    Ok(Json(
        state
            .service
            .list_construction_activities(project_id.as_deref())
            .await?,
    ))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ConstructionActivity>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_construction_activity(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewConstructionActivity>,
) -> Result<(StatusCode, Json<ConstructionActivity>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    let activity = state
        .service
        .create_construction_activity(user.actor(), &new)
        .await?;
    state.publish_payload(EventKind::ActivityUpdate, &activity, Some(&activity.project_id));
    Ok(created(activity))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ConstructionActivityUpdate>,
) -> Result<Json<ConstructionActivity>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    let activity = state
        .service
        .update_construction_activity(user.actor(), &id, update)
        .await?;
    state.publish_payload(EventKind::ActivityUpdate, &activity, Some(&activity.project_id));
    Ok(Json(activity))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    state
        .service
        .delete_construction_activity(user.actor(), &id)
        .await?;
    Ok(deleted(&id))
}

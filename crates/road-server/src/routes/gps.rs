//! GPS points and their photos.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use road_auth::Permission;
use road_core::entities::{GpsPhoto, GpsPoint, NewGpsPhoto, NewGpsPoint};
use road_core::enums::{Phase, RoadSide};
use road_core::events::EventKind;
use road_db::repos::gps::GpsFilter;
use road_db::updates::gps::GpsPointUpdate;

use super::{created, deleted, non_blank};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/gps-points", get(list).post(create))
        .route("/api/gps-points/{id}", get(fetch).put(update).delete(remove))
        .route("/api/gps-points/{id}/photos", get(list_photos).post(add_photo))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    project_id: Option<String>,
    phase: Option<Phase>,
    side: Option<RoadSide>,
    limit: Option<u32>,
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<GpsPoint>>, ApiError> {
    user.require(Permission::View)?;
    let filter = GpsFilter {
        project_id: non_blank(query.project_id),
        phase: query.phase,
        side: query.side,
        limit: query.limit,
    };
    Ok(Json(state.service.list_gps_points(&filter).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GpsPoint>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_gps_point(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewGpsPoint>,
) -> Result<(StatusCode, Json<GpsPoint>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    let point = state.service.create_gps_point(user.actor(), &new).await?;
    state.publish_payload(EventKind::GpsPointAdded, &point, Some(&point.project_id));
    Ok(created(point))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<GpsPointUpdate>,
) -> Result<Json<GpsPoint>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    Ok(Json(
        state.service.update_gps_point(user.actor(), &id, update).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::RecordFieldData)?;
    state.service.delete_gps_point(user.actor(), &id).await?;
    Ok(deleted(&id))
}

async fn list_photos(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<GpsPhoto>>, ApiError> {
    user.require(Permission::View)?;
    state.service.get_gps_point(&id).await?;
    Ok(Json(state.service.list_gps_photos(&id).await?))
}

async fn add_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(new): ApiJson<NewGpsPhoto>,
) -> Result<(StatusCode, Json<GpsPhoto>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    Ok(created(
        state.service.add_gps_photo(user.actor(), &id, &new).await?,
    ))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{NewProvince, Province};
use road_db::updates::province::ProvinceUpdate;

use super::{created, deleted};
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/provinces", get(list).post(create))
        .route("/api/provinces/{id}", get(fetch).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Province>>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.list_provinces().await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Province>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_province(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewProvince>,
) -> Result<(StatusCode, Json<Province>), ApiError> {
    user.require(Permission::Administer)?;
    Ok(created(state.service.create_province(user.actor(), &new).await?))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProvinceUpdate>,
) -> Result<Json<Province>, ApiError> {
    user.require(Permission::Administer)?;
    Ok(Json(state.service.update_province(user.actor(), &id, update).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::Administer)?;
    state.service.delete_province(user.actor(), &id).await?;
    Ok(deleted(&id))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{Contractor, NewContractor};
use road_db::updates::contractor::ContractorUpdate;

use super::{created, deleted};
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/contractors", get(list).post(create))
        .route("/api/contractors/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Contractor>>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.list_contractors().await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Contractor>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_contractor(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewContractor>,
) -> Result<(StatusCode, Json<Contractor>), ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(created(state.service.create_contractor(user.actor(), &new).await?))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ContractorUpdate>,
) -> Result<Json<Contractor>, ApiError> {
    user.require(Permission::ManageProjects)?;
    Ok(Json(
        state.service.update_contractor(user.actor(), &id, update).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::ManageProjects)?;
    state.service.delete_contractor(user.actor(), &id).await?;
    Ok(deleted(&id))
}

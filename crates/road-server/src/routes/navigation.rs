//! Sidebar navigation. Listing is filtered to the caller's role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use road_auth::Permission;
use road_core::entities::{NavigationItem, NewNavigationItem};
use road_db::updates::navigation::NavigationUpdate;

use super::{created, deleted};
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/navigation", get(list).post(create))
        .route("/api/navigation/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<NavigationItem>>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.list_navigation(Some(user.role())).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewNavigationItem>,
) -> Result<(StatusCode, Json<NavigationItem>), ApiError> {
    user.require(Permission::Administer)?;
    Ok(created(
        state.service.create_navigation_item(user.actor(), &new).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<NavigationUpdate>,
) -> Result<Json<NavigationItem>, ApiError> {
    user.require(Permission::Administer)?;
    Ok(Json(
        state
            .service
            .update_navigation_item(user.actor(), &id, update)
            .await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::Administer)?;
    state.service.delete_navigation_item(user.actor(), &id).await?;
    Ok(deleted(&id))
}

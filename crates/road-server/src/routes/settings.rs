use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use road_auth::Permission;
use road_core::entities::SystemSetting;

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(list))
        .route("/api/settings/{key}", put(upsert))
}

#[derive(Debug, Deserialize)]
struct SettingValue {
    value: String,
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SystemSetting>>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.list_settings().await?))
}

async fn upsert(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
    ApiJson(body): ApiJson<SettingValue>,
) -> Result<Json<SystemSetting>, ApiError> {
    user.require(Permission::Administer)?;
    Ok(Json(
        state.service.put_setting(user.actor(), &key, &body.value).await?,
    ))
}

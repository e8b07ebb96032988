//! User administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use road_auth::{Permission, hash_password_with_cost};
use road_core::entities::{NewUser, User};
use road_core::enums::Role;
use road_db::updates::user::UserUpdate;

use super::{created, deleted};
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", get(fetch).put(update).delete(remove))
}

/// Password hashing is CPU-bound; keep it off the async workers.
async fn hash(state: &AppState, password: String) -> Result<String, ApiError> {
    let cost = state.password_cost;
    let hashed = tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
        .await
        .map_err(anyhow::Error::new)??;
    Ok(hashed)
}

async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<User>>, ApiError> {
    user.require(Permission::Administer)?;
    Ok(Json(state.service.list_users().await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    user.require(Permission::Administer)?;
    new.validate()?;
    let password_hash = hash(&state, new.password.clone()).await?;
    let created_user = state
        .service
        .create_user(user.actor(), &new, &password_hash)
        .await?;
    Ok(created(created_user))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    user.require(Permission::Administer)?;
    Ok(Json(state.service.get_user(&id).await?))
}

#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    password: Option<String>,
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    user.require(Permission::Administer)?;
    if id == user.id() && request.role.is_some_and(|r| r != Role::Admin) {
        return Err(ApiError::bad_request("admins cannot demote themselves"));
    }
    let password_hash = match request.password {
        Some(password) => Some(hash(&state, password).await?),
        None => None,
    };
    let update = UserUpdate {
        email: request.email.map(|e| e.trim().to_lowercase()),
        name: request.name,
        role: request.role,
        password_hash,
    };
    Ok(Json(state.service.update_user(user.actor(), &id, update).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require(Permission::Administer)?;
    if id == user.id() {
        return Err(ApiError::bad_request("admins cannot delete their own account"));
    }
    state.service.delete_user(user.actor(), &id).await?;
    Ok(deleted(&id))
}

//! Login and the current-user endpoint.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use road_auth::{AuthError, Permission, verify_against_unmatchable, verify_password};
use road_core::entities::User;

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    expires_at: DateTime<Utc>,
    user: User,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = request.email.trim().to_lowercase();
    let password = request.password;
    let Some((user, hash)) = state.service.find_credentials(&email).await? else {
        tokio::task::spawn_blocking(move || verify_against_unmatchable(&password))
            .await
            .map_err(anyhow::Error::new)?;
        tracing::info!(%email, "login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::new)?;
    if !matches {
        tracing::info!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = state.jwt.issue(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "login");
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, ApiError> {
    user.require(Permission::View)?;
    Ok(Json(state.service.get_user(user.id()).await?))
}

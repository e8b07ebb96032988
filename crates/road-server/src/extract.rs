//! Request extractors: the authenticated caller and JSON/query wrappers whose
//! rejections use the API error body.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, request::Parts};

use road_auth::{AuthError, Permission, authorize, extract_bearer};
use road_core::enums::Role;
use road_core::errors::CoreError;
use road_core::identity::AuthIdentity;
use road_db::error::DatabaseError;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The caller, authenticated from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthIdentity);

impl AuthUser {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.user_id
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.0.role
    }

    /// Acting user id in the form the service layer records.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        Some(self.id())
    }

    /// # Errors
    ///
    /// `Forbidden` when the caller's role lacks `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        Ok(authorize(self.role(), permission)?)
    }
}

/// Validate the bearer token in `headers`, falling back to `query_token` when
/// there is no `Authorization` header. The identity carries the account's
/// stored role, not the role the token was issued with.
///
/// # Errors
///
/// `Unauthorized` for a missing, malformed, expired, or forged token, or one
/// whose account has been deleted.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<AuthIdentity, ApiError> {
    let token = match headers.get(AUTHORIZATION) {
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::InvalidScheme)?;
            extract_bearer(value)?
        }
        None => query_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NotAuthenticated)?,
    };
    let mut identity = state.jwt.validate(token)?.to_identity();
    let user = match state.service.get_user(&identity.user_id).await {
        Ok(user) => user,
        Err(DatabaseError::Core(CoreError::NotFound { .. })) => {
            return Err(AuthError::InvalidToken("account no longer exists".into()).into());
        }
        Err(e) => return Err(e.into()),
    };
    if user.role != identity.role {
        tracing::debug!(
            user_id = %user.id,
            token_role = %identity.role,
            role = %user.role,
            "role changed since the token was issued"
        );
    }
    identity.email = user.email;
    identity.role = user.role;
    Ok(identity)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(state, &parts.headers, None).await.map(Self)
    }
}

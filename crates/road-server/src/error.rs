//! HTTP error mapping.
//!
//! Every crate error converges here. Client mistakes become 400/401/403/404
//! with the error's own message; anything else is logged and returned as a
//! generic 500.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use road_auth::AuthError;
use road_core::errors::CoreError;
use road_db::csv_io::CsvError;
use road_db::error::DatabaseError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Core(CoreError::NotFound { entity_type, id }) => {
                Self::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::Core(
                core @ (CoreError::Validation(_) | CoreError::InvalidTransition { .. }),
            ) => Self::BadRequest(core.to_string()),
            e if e.is_unique_violation() => {
                Self::BadRequest("a record with the same unique value already exists".into())
            }
            e if e.is_constraint_violation() => {
                Self::BadRequest(format!("rejected by a database constraint: {e}"))
            }
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NotAuthenticated
            | AuthError::InvalidScheme
            | AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidToken(_) => Self::Unauthorized(e.to_string()),
            AuthError::Forbidden { .. } => Self::Forbidden(e.to_string()),
            AuthError::Hashing(message) => Self::BadRequest(message),
            AuthError::Signing(_) => Self::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<CsvError> for ApiError {
    fn from(e: CsvError) -> Self {
        match e {
            CsvError::Header { .. } | CsvError::Csv(_) => Self::BadRequest(e.to_string()),
            CsvError::Database(db) => db.into(),
            CsvError::Io(_) | CsvError::Encoding(_) => Self::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        DatabaseError::Core(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(e.body_text())
    }
}

use thiserror::Error;

use road_core::enums::Role;

use crate::permissions::Permission;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    NotAuthenticated,

    #[error("invalid authorization scheme (expected Bearer)")]
    InvalidScheme,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

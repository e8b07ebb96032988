//! HS256 session tokens.
//!
//! Tokens are taken from the `Authorization` header using the Bearer scheme,
//! or from a `token` query parameter on the event stream.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use road_config::AuthConfig;
use road_core::entities::User;
use road_core::enums::Role;
use road_core::identity::AuthIdentity;

use crate::error::AuthError;

/// Ten years; longer lifetimes are clamped.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Claims carried by a Roadtrack session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    #[must_use]
    pub fn to_identity(&self) -> AuthIdentity {
        AuthIdentity {
            user_id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signing and validation keys for one secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: Option<String>,
    ttl: TimeDelta,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    #[must_use]
    pub fn new(secret: &[u8], issuer: Option<String>, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer,
            ttl: TimeDelta::seconds(i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or_default()),
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.issuer.clone(),
            config.token_ttl_secs,
        )
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// `Signing` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        tracing::debug!(user_id = %user.id, %expires_at, "token issued");
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, expiry, and (when configured) issuer.
    ///
    /// # Errors
    ///
    /// `TokenExpired` or `InvalidToken`.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "token rejected");
                    AuthError::InvalidToken(e.to_string())
                }
            })
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// # Errors
///
/// `InvalidScheme` for anything but `Bearer`, `NotAuthenticated` for an
/// empty token.
pub fn extract_bearer(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::NotAuthenticated);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(role: Role) -> User {
        User {
            id: "usr-0a1b2c3d".into(),
            email: "kila@works.gov.pg".into(),
            name: "Kila Morea".into(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_validate() {
        let config = JwtConfig::new(b"test-secret", None, 3_600);
        let issued = config.issue(&user(Role::Engineer)).unwrap();
        let claims = config.validate(&issued.token).unwrap();

        assert_eq!(claims.sub, "usr-0a1b2c3d");
        assert_eq!(claims.role, Role::Engineer);
        assert_eq!(claims.exp - claims.iat, 3_600);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(
            claims.to_identity(),
            AuthIdentity {
                user_id: "usr-0a1b2c3d".into(),
                email: "kila@works.gov.pg".into(),
                role: Role::Engineer,
            }
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = JwtConfig::new(b"test-secret", None, 60);
        let issued = config
            .issue_at(&user(Role::Viewer), Utc::now() - TimeDelta::hours(2))
            .unwrap();
        assert_eq!(config.validate(&issued.token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = JwtConfig::new(b"secret-1", None, 60)
            .issue(&user(Role::Admin))
            .unwrap();
        let result = JwtConfig::new(b"secret-2", None, 60).validate(&issued.token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn issuer_must_match_when_configured() {
        let issued = JwtConfig::new(b"s", Some("roadtrack".into()), 60)
            .issue(&user(Role::Admin))
            .unwrap();
        assert!(
            JwtConfig::new(b"s", Some("roadtrack".into()), 60)
                .validate(&issued.token)
                .is_ok()
        );
        assert!(
            JwtConfig::new(b"s", Some("elsewhere".into()), 60)
                .validate(&issued.token)
                .is_err()
        );
    }

    #[test]
    fn from_config_uses_ttl_and_issuer() {
        let config = JwtConfig::from_config(&AuthConfig {
            jwt_secret: "abc".into(),
            token_ttl_secs: 120,
            issuer: Some("png-roads".into()),
        });
        let claims = config
            .validate(&config.issue(&user(Role::Manager)).unwrap().token)
            .unwrap();
        assert_eq!(claims.iss.as_deref(), Some("png-roads"));
        assert_eq!(claims.exp - claims.iat, 120);
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), Err(AuthError::InvalidScheme));
        assert_eq!(extract_bearer("Bearer "), Err(AuthError::NotAuthenticated));
    }
}

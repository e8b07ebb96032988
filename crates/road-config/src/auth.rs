//! Token signing configuration.

use serde::{Deserialize, Serialize};

/// Default token lifetime: 24 hours.
const fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HMAC secret for signing JWTs. Required to serve.
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Optional `iss` claim to set and require.
    #[serde(default)]
    pub issuer: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            issuer: None,
        }
    }
}

impl AuthConfig {
    /// Check if a signing secret is available.
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = AuthConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.token_ttl_secs, 86_400);
        assert!(config.issuer.is_none());
    }
}

//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_upload_base_path() -> String {
    "/uploads".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// URL path prefix uploaded files are served under.
    #[serde(default = "default_upload_base_path")]
    pub upload_base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_base_path: default_upload_base_path(),
        }
    }
}

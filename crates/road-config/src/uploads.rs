//! Image upload configuration.

use serde::{Deserialize, Serialize};

fn default_dir() -> String {
    "uploads".to_string()
}

/// 5 MiB.
const fn default_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Largest accepted file, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Accepted `Content-Type` values.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            max_bytes: default_max_bytes(),
            allowed_types: default_allowed_types(),
        }
    }
}

impl UploadConfig {
    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

//! libSQL database configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    "roadtrack.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file path, or `":memory:"`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

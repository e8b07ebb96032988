//! User update payload.

use serde::{Deserialize, Serialize};
use road_core::enums::Role;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Already hashed. Never read from a request body or written to the log.
    #[serde(skip)]
    pub password_hash: Option<String>,
}

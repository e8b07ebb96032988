use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ActivityAction, EntityType};

/// An append-only log entry recording a mutation and who made it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Activity {
    pub id: String,
    pub user_id: Option<String>,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: ActivityAction,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

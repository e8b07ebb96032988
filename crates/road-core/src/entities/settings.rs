use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A key-value system setting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

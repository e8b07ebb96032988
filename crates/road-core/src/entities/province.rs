use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::non_empty;
use crate::errors::CoreError;

/// A PNG province (e.g. Morobe, `MRB`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Province {
    pub id: String,
    pub name: String,
    /// Short unique code.
    pub code: String,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewProvince {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl NewProvince {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the name or code is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("name", &self.name)?;
        non_empty("code", &self.code)
    }
}

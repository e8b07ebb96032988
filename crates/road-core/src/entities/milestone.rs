use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::non_empty;
use crate::enums::MilestoneStatus;
use crate::errors::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectMilestone {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: MilestoneStatus,
    /// Set when the status first becomes `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewMilestone {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewMilestone {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the project id or title is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        non_empty("title", &self.title)
    }
}

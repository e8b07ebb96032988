use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{date_order, non_empty, percent};
use crate::errors::CoreError;

/// A periodic progress report submitted for a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProgressReport {
    pub id: String,
    pub project_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub summary: String,
    pub percent_complete: f64,
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewProgressReport {
    pub project_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub summary: String,
    pub percent_complete: f64,
}

impl NewProgressReport {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty summary, a percentage
    /// outside 0..=100, or a period that ends before it starts.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        non_empty("summary", &self.summary)?;
        percent("percent_complete", self.percent_complete)?;
        date_order(
            "period_start",
            Some(self.period_start),
            "period_end",
            Some(self.period_end),
        )
    }
}

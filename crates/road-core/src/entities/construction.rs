use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{date_order, non_empty, percent};
use crate::enums::{ConstructionStatus, Phase};
use crate::errors::CoreError;

/// A unit of construction work tracked by progress percentage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConstructionActivity {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub phase: Option<Phase>,
    pub status: ConstructionStatus,
    pub progress_percent: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewConstructionActivity {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub phase: Option<Phase>,
    /// Defaults to `not_started`.
    #[serde(default)]
    pub status: Option<ConstructionStatus>,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewConstructionActivity {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty name, a progress outside
    /// 0..=100, or unordered dates.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        non_empty("name", &self.name)?;
        percent("progress_percent", self.progress_percent)?;
        date_order("start_date", self.start_date, "end_date", self.end_date)
    }
}

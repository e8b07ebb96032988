use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{date_order, non_empty, non_negative, opt_non_negative};
use crate::enums::ProjectStatus;
use crate::errors::CoreError;

/// A road-construction project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub province_id: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Total budget in PGK.
    pub budget: Option<f64>,
    /// Road length in kilometres.
    pub length_km: Option<f64>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub province_id: Option<String>,
    /// Defaults to `planning`.
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub length_km: Option<f64>,
}

impl NewProject {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty name, negative amounts,
    /// or an end date before the start date.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("name", &self.name)?;
        opt_non_negative("budget", self.budget)?;
        opt_non_negative("length_km", self.length_km)?;
        date_order("start_date", self.start_date, "end_date", self.end_date)
    }
}

/// A named stretch of a project's alignment, by chainage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoadSection {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub start_chainage_km: f64,
    pub end_chainage_km: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewSection {
    pub name: String,
    pub start_chainage_km: f64,
    pub end_chainage_km: f64,
}

impl NewSection {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty name, negative chainage,
    /// or an end chainage before the start.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("name", &self.name)?;
        non_negative("start_chainage_km", self.start_chainage_km)?;
        non_negative("end_chainage_km", self.end_chainage_km)?;
        if self.end_chainage_km < self.start_chainage_km {
            return Err(CoreError::validation(
                "end_chainage_km must not be less than start_chainage_km",
            ));
        }
        Ok(())
    }
}

/// Progress summary for a single project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProjectStats {
    pub project_id: String,
    pub gps_point_total: u64,
    /// Keyed by phase (`drainage`, `basket`, `sealing`).
    pub gps_points_by_phase: BTreeMap<String, u64>,
    /// Keyed by milestone status.
    pub milestones_by_status: BTreeMap<String, u64>,
    pub funding_committed: f64,
    pub funding_disbursed: f64,
    pub open_incidents: u64,
    /// Percent complete from the most recent progress report.
    pub latest_percent_complete: Option<f64>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{non_empty, validate_coordinates};
use crate::enums::{IncidentSeverity, IncidentStatus};
use crate::errors::CoreError;

/// A health, safety, or environment incident on site.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct HseIncident {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    pub occurred_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reported_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewIncident {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    /// Defaults to the time of the report.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl NewIncident {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty title, a half-specified
    /// location, or out-of-range coordinates.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        non_empty("title", &self.title)?;
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => validate_coordinates(lat, lon),
            (None, None) => Ok(()),
            _ => Err(CoreError::validation(
                "latitude and longitude must be given together",
            )),
        }
    }
}

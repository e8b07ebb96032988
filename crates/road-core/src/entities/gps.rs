use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{non_empty, non_negative, opt_non_negative, validate_coordinates};
use crate::enums::{Phase, RoadSide};
use crate::errors::CoreError;

/// A geotagged record of construction progress at a location, phase, and road side.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GpsPoint {
    pub id: String,
    pub project_id: String,
    pub section_id: Option<String>,
    pub phase: Phase,
    pub side: RoadSide,
    pub latitude: f64,
    pub longitude: f64,
    /// Chainage in metres from the project start.
    pub distance: f64,
    pub notes: Option<String>,
    pub elevation: Option<f64>,
    /// Horizontal accuracy reported by the device, in metres.
    pub accuracy: Option<f64>,
    pub recorded_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewGpsPoint {
    pub project_id: String,
    #[serde(default)]
    pub section_id: Option<String>,
    pub phase: Phase,
    pub side: RoadSide,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Defaults to the time of insertion.
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewGpsPoint {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for out-of-range coordinates, a negative
    /// distance or accuracy, or a non-finite elevation.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        validate_coordinates(self.latitude, self.longitude)?;
        non_negative("distance", self.distance)?;
        opt_non_negative("accuracy", self.accuracy)?;
        if self.elevation.is_some_and(|e| !e.is_finite()) {
            return Err(CoreError::validation("elevation must be a finite number"));
        }
        Ok(())
    }
}

/// A photo attached to a GPS point. `url` points at an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GpsPhoto {
    pub id: String,
    pub gps_point_id: String,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewGpsPhoto {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> NewGpsPoint {
        NewGpsPoint {
            project_id: "prj-1".into(),
            section_id: None,
            phase: Phase::Drainage,
            side: RoadSide::Left,
            latitude: -6.72,
            longitude: 146.99,
            distance: 1250.0,
            notes: None,
            elevation: Some(1620.5),
            accuracy: Some(3.2),
            recorded_at: None,
        }
    }

    #[test]
    fn valid_point_passes() {
        assert!(point().validate().is_ok());
    }

    #[test]
    fn negative_distance_fails() {
        let mut p = point();
        p.distance = -5.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn negative_accuracy_fails() {
        let mut p = point();
        p.accuracy = Some(-0.1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn infinite_elevation_fails() {
        let mut p = point();
        p.elevation = Some(f64::INFINITY);
        assert!(p.validate().is_err());
    }
}

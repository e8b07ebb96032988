//! Field-level validation shared by the create payloads and the update paths.

use chrono::NaiveDate;

use crate::errors::CoreError;

pub fn non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::validation(format!(
            "{field} must be a non-negative number (got {value})"
        )));
    }
    Ok(())
}

pub fn opt_non_negative(field: &str, value: Option<f64>) -> Result<(), CoreError> {
    value.map_or(Ok(()), |v| non_negative(field, v))
}

pub fn percent(field: &str, value: f64) -> Result<(), CoreError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(CoreError::validation(format!(
            "{field} must be between 0 and 100 (got {value})"
        )));
    }
    Ok(())
}

pub fn date_order(
    start_field: &str,
    start: Option<NaiveDate>,
    end_field: &str,
    end: Option<NaiveDate>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(CoreError::validation(format!(
                "{end_field} ({end}) is before {start_field} ({start})"
            )));
        }
    }
    Ok(())
}

/// Check that a coordinate pair is finite and within WGS84 bounds.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the offending axis.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), CoreError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CoreError::validation(format!(
            "latitude must be between -90 and 90 (got {latitude})"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::validation(format!(
            "longitude must be between -180 and 180 (got {longitude})"
        )));
    }
    Ok(())
}

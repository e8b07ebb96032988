//! Row-to-entity parsing helpers and the dynamic UPDATE builder.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual
//! datetime format (`SQLite`'s `datetime('now')` vs Rust's `to_rfc3339()`).

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not a calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}")))
}

/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string is not a calendar date.
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_date(s)?)),
        _ => Ok(None),
    }
}

/// Format a date for storage.
#[must_use]
pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all road-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a nullable REAL column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_f64(row: &libsql::Row, idx: i32) -> Result<Option<f64>, DatabaseError> {
    Ok(row.get::<Option<f64>>(idx)?)
}

/// Read a COUNT(*) column as `u64`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_count(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    let n = row.get::<i64>(idx)?;
    u64::try_from(n).map_err(|_| DatabaseError::InvalidState(format!("negative count {n}")))
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Convert an optional value into a bind parameter, `NULL` when absent.
pub fn opt_value<T: Into<libsql::Value>>(value: Option<T>) -> libsql::Value {
    value.map_or(libsql::Value::Null, Into::into)
}

/// Collects `column = ?n` assignments for a dynamic `UPDATE`.
///
/// Only fields that were explicitly provided are pushed, so the resulting
/// statement leaves every other column untouched.
#[derive(Debug, Default)]
pub struct UpdateSet {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl UpdateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    /// Assign a nullable column; `None` writes `NULL`.
    pub fn set_nullable<T: Into<libsql::Value>>(&mut self, column: &str, value: Option<T>) {
        self.params.push(opt_value(value));
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Render `UPDATE {table} SET ... WHERE {key_column} = ?n`.
    #[must_use]
    pub fn into_statement(
        mut self,
        table: &str,
        key_column: &str,
        key: &str,
    ) -> (String, Vec<libsql::Value>) {
        self.params.push(key.into());
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key_column} = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}

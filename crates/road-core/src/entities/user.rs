use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::non_empty;
use crate::enums::Role;
use crate::errors::CoreError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A user account. The password hash lives only in the database.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a user. `password` is plain text and hashed by `road-auth`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

impl NewUser {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a malformed email, an empty name,
    /// or a password shorter than [`MIN_PASSWORD_LEN`].
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_email(&self.email)?;
        non_empty("name", &self.name)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain.
///
/// # Errors
///
/// Returns `CoreError::Validation` when the address is malformed.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::validation(format!("invalid email address '{email}'"));
    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

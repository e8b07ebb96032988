use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::non_empty;
use super::user::validate_email;
use crate::errors::CoreError;

/// A licensed construction contractor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Contractor {
    pub id: String,
    pub name: String,
    /// Unique across all contractors.
    pub license_number: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewContractor {
    pub name: String,
    pub license_number: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewContractor {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for empty name/license or a malformed email.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("name", &self.name)?;
        non_empty("license_number", &self.license_number)?;
        if let Some(email) = &self.contact_email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Assignment of a contractor to a project (composite key).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectContractor {
    pub project_id: String,
    pub contractor_id: String,
    /// e.g. `"main"`, `"subcontractor"`.
    pub contract_role: Option<String>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssignContractor {
    pub contractor_id: String,
    #[serde(default)]
    pub contract_role: Option<String>,
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::non_empty;
use crate::enums::Role;
use crate::errors::CoreError;

/// A sidebar navigation entry, visible to users at or above `min_role`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NavigationItem {
    pub id: String,
    pub label: String,
    pub href: String,
    pub icon: Option<String>,
    pub sort_order: i64,
    pub min_role: Role,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NavigationItem {
    #[must_use]
    pub const fn visible_to(&self, role: Role) -> bool {
        role.at_least(self.min_role)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewNavigationItem {
    pub label: String,
    pub href: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    /// Defaults to `viewer`.
    #[serde(default)]
    pub min_role: Option<Role>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl NewNavigationItem {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty label or an href that is
    /// not an absolute path.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("label", &self.label)?;
        if !self.href.starts_with('/') {
            return Err(CoreError::validation(format!(
                "href must start with '/' (got '{}')",
                self.href
            )));
        }
        Ok(())
    }
}

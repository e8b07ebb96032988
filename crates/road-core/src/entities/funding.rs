use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::checks::{non_empty, non_negative};
use crate::errors::CoreError;

/// Default currency for funding records.
pub const DEFAULT_CURRENCY: &str = "PGK";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// A funding commitment against a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProjectFunding {
    pub id: String,
    pub project_id: String,
    /// e.g. `"GoPNG"`, `"ADB"`, `"World Bank"`.
    pub source: String,
    pub amount: f64,
    pub currency: String,
    pub disbursed_amount: f64,
    pub funding_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewFunding {
    pub project_id: String,
    pub source: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub disbursed_amount: f64,
    #[serde(default)]
    pub funding_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewFunding {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for negative amounts or a disbursement
    /// larger than the commitment.
    pub fn validate(&self) -> Result<(), CoreError> {
        non_empty("project_id", &self.project_id)?;
        non_empty("source", &self.source)?;
        non_empty("currency", &self.currency)?;
        non_negative("amount", self.amount)?;
        validate_disbursement(self.amount, self.disbursed_amount)
    }
}

/// # Errors
///
/// Returns `CoreError::Validation` unless `0 <= disbursed <= amount`.
pub fn validate_disbursement(amount: f64, disbursed: f64) -> Result<(), CoreError> {
    non_negative("disbursed_amount", disbursed)?;
    if disbursed > amount {
        return Err(CoreError::validation(format!(
            "disbursed_amount ({disbursed}) exceeds amount ({amount})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_defaults_to_kina() {
        let funding: NewFunding =
            serde_json::from_str(r#"{"project_id":"prj-1","source":"ADB","amount":1000000}"#)
                .unwrap();
        assert_eq!(funding.currency, "PGK");
        assert!(funding.validate().is_ok());
    }

    #[test]
    fn over_disbursement_is_rejected() {
        assert!(validate_disbursement(100.0, 150.0).is_err());
        assert!(validate_disbursement(100.0, 100.0).is_ok());
    }
}

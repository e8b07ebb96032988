//! Project funding repository.

use chrono::Utc;

use road_core::entities::checks::{non_empty, non_negative};
use road_core::entities::{NewFunding, ProjectFunding, validate_disbursement};
use road_core::enums::{ActivityAction, EntityType};
use road_core::ids::PREFIX_FUNDING;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, format_date, get_opt_string, parse_datetime, parse_optional_date};
use crate::service::RoadService;
use crate::updates::funding::FundingUpdate;

const SELECT_COLS: &str = "id, project_id, source, amount, currency, disbursed_amount, \
     funding_date, notes, created_at, updated_at";

fn row_to_funding(row: &libsql::Row) -> Result<ProjectFunding, DatabaseError> {
    Ok(ProjectFunding {
        id: row.get(0)?,
        project_id: row.get(1)?,
        source: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        disbursed_amount: row.get(5)?,
        funding_date: parse_optional_date(get_opt_string(row, 6)?.as_deref())?,
        notes: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_funding(
        &self,
        actor: Option<&str>,
        new: &NewFunding,
    ) -> Result<ProjectFunding, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_FUNDING).await?;
        let currency = new.currency.trim().to_uppercase();

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO funding ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                libsql::params![
                    id.as_str(),
                    new.project_id.as_str(),
                    new.source.trim(),
                    new.amount,
                    currency.as_str(),
                    new.disbursed_amount,
                    new.funding_date.map(format_date),
                    new.notes.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Funding,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({
                "project_id": new.project_id,
                "amount": new.amount,
                "currency": currency,
            })),
        )
        .await?;

        Ok(ProjectFunding {
            id,
            project_id: new.project_id.clone(),
            source: new.source.trim().to_string(),
            amount: new.amount,
            currency,
            disbursed_amount: new.disbursed_amount,
            funding_date: new.funding_date,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no funding record has this id.
    pub async fn get_funding(&self, id: &str) -> Result<ProjectFunding, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM funding WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Funding, id))?;
        row_to_funding(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_funding(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<ProjectFunding>, DatabaseError> {
        let (where_clause, params): (&str, Vec<libsql::Value>) = match project_id {
            Some(project_id) => ("WHERE project_id = ?1", vec![project_id.into()]),
            None => ("", Vec::new()),
        };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM funding {where_clause}
                     ORDER BY funding_date IS NULL, funding_date, created_at"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut funding = Vec::new();
        while let Some(row) = rows.next().await? {
            funding.push(row_to_funding(&row)?);
        }
        Ok(funding)
    }

    /// Apply a partial update. The disbursed amount is checked against the
    /// resulting amount, so lowering `amount` below what was paid out fails.
    ///
    /// # Errors
    ///
    /// `NotFound` or validation errors.
    pub async fn update_funding(
        &self,
        actor: Option<&str>,
        id: &str,
        update: FundingUpdate,
    ) -> Result<ProjectFunding, DatabaseError> {
        if let Some(ref source) = update.source {
            non_empty("source", source)?;
        }
        if let Some(ref currency) = update.currency {
            non_empty("currency", currency)?;
        }
        let _gate = self.write_lock().await;
        let current = self.get_funding(id).await?;
        let amount = update.amount.unwrap_or(current.amount);
        non_negative("amount", amount)?;
        validate_disbursement(amount, update.disbursed_amount.unwrap_or(current.disbursed_amount))?;

        let mut set = UpdateSet::new();
        if let Some(ref source) = update.source {
            set.set("source", source.trim());
        }
        if let Some(amount) = update.amount {
            set.set("amount", amount);
        }
        if let Some(ref currency) = update.currency {
            set.set("currency", currency.trim().to_uppercase());
        }
        if let Some(disbursed) = update.disbursed_amount {
            set.set("disbursed_amount", disbursed);
        }
        if let Some(funding_date) = update.funding_date {
            set.set_nullable("funding_date", funding_date.map(format_date));
        }
        if let Some(ref notes) = update.notes {
            set.set_nullable("notes", notes.clone());
        }
        if set.is_empty() {
            return Ok(current);
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("funding", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.log_activity(
            actor,
            EntityType::Funding,
            id,
            ActivityAction::Updated,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_funding(id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no funding record has this id.
    pub async fn delete_funding(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM funding WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Funding, id));
        }
        self.log_activity(actor, EntityType::Funding, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_test_project, test_service};
    use road_core::errors::CoreError;

    fn new_funding(project_id: &str) -> NewFunding {
        NewFunding {
            project_id: project_id.into(),
            source: "Asian Development Bank".into(),
            amount: 1_000_000.0,
            currency: "pgk".into(),
            disbursed_amount: 250_000.0,
            funding_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_uppercases_currency() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Funded road").await;
        let funding = svc.create_funding(None, &new_funding(&project.id)).await.unwrap();
        assert!(funding.id.starts_with("fnd-"));
        assert_eq!(funding.currency, "PGK");
        assert_eq!(svc.get_funding(&funding.id).await.unwrap(), funding);
    }

    #[tokio::test]
    async fn lowering_amount_below_disbursed_fails() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Overdrawn road").await;
        let funding = svc.create_funding(None, &new_funding(&project.id)).await.unwrap();

        let err = svc
            .update_funding(
                None,
                &funding.id,
                FundingUpdate {
                    amount: Some(100_000.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));

        let updated = svc
            .update_funding(
                None,
                &funding.id,
                FundingUpdate {
                    disbursed_amount: Some(1_000_000.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!((updated.disbursed_amount - updated.amount).abs() < f64::EPSILON);
    }
}

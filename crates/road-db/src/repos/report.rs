//! Progress report repository. Reports are append-only apart from deletion.

use chrono::Utc;

use road_core::entities::{NewProgressReport, ProgressReport};
use road_core::enums::{ActivityAction, EntityType};
use road_core::ids::PREFIX_REPORT;

use crate::error::DatabaseError;
use crate::helpers::{format_date, get_opt_string, parse_date, parse_datetime};
use crate::service::RoadService;

const SELECT_COLS: &str =
    "id, project_id, period_start, period_end, summary, percent_complete, submitted_by, created_at";

fn row_to_report(row: &libsql::Row) -> Result<ProgressReport, DatabaseError> {
    Ok(ProgressReport {
        id: row.get(0)?,
        project_id: row.get(1)?,
        period_start: parse_date(&row.get::<String>(2)?)?,
        period_end: parse_date(&row.get::<String>(3)?)?,
        summary: row.get(4)?,
        percent_complete: row.get(5)?,
        submitted_by: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_report(
        &self,
        actor: Option<&str>,
        new: &NewProgressReport,
    ) -> Result<ProgressReport, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_REPORT).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO progress_reports ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                libsql::params![
                    id.as_str(),
                    new.project_id.as_str(),
                    format_date(new.period_start),
                    format_date(new.period_end),
                    new.summary.trim(),
                    new.percent_complete,
                    actor,
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Report,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({
                "project_id": new.project_id,
                "percent_complete": new.percent_complete,
            })),
        )
        .await?;

        Ok(ProgressReport {
            id,
            project_id: new.project_id.clone(),
            period_start: new.period_start,
            period_end: new.period_end,
            summary: new.summary.trim().to_string(),
            percent_complete: new.percent_complete,
            submitted_by: actor.map(String::from),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no report has this id.
    pub async fn get_report(&self, id: &str) -> Result<ProgressReport, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM progress_reports WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Report, id))?;
        row_to_report(&row)
    }

    /// Reports newest period first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_reports(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<ProgressReport>, DatabaseError> {
        let (where_clause, params): (&str, Vec<libsql::Value>) = match project_id {
            Some(project_id) => ("WHERE project_id = ?1", vec![project_id.into()]),
            None => ("", Vec::new()),
        };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM progress_reports {where_clause}
                     ORDER BY period_end DESC, created_at DESC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next().await? {
            reports.push(row_to_report(&row)?);
        }
        Ok(reports)
    }

    /// # Errors
    ///
    /// `NotFound` when no report has this id.
    pub async fn delete_report(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM progress_reports WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Report, id));
        }
        self.log_activity(actor, EntityType::Report, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

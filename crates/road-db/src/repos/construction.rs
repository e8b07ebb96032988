//! Construction activity repository.

use chrono::Utc;

use road_core::entities::checks::{date_order, non_empty, percent};
use road_core::entities::{ConstructionActivity, NewConstructionActivity};
use road_core::enums::{ActivityAction, ConstructionStatus, EntityType};
use road_core::ids::PREFIX_CONSTRUCTION;

use crate::error::DatabaseError;
use crate::helpers::{
    UpdateSet, format_date, get_opt_string, parse_datetime, parse_enum, parse_optional_date,
};
use crate::service::RoadService;
use crate::updates::construction::ConstructionActivityUpdate;

const SELECT_COLS: &str = "id, project_id, name, phase, status, progress_percent, start_date, \
     end_date, notes, created_at, updated_at";

fn row_to_activity(row: &libsql::Row) -> Result<ConstructionActivity, DatabaseError> {
    Ok(ConstructionActivity {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        phase: get_opt_string(row, 3)?
            .map(|s| parse_enum(&s))
            .transpose()?,
        status: parse_enum(&row.get::<String>(4)?)?,
        progress_percent: row.get(5)?,
        start_date: parse_optional_date(get_opt_string(row, 6)?.as_deref())?,
        end_date: parse_optional_date(get_opt_string(row, 7)?.as_deref())?,
        notes: get_opt_string(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_construction_activity(
        &self,
        actor: Option<&str>,
        new: &NewConstructionActivity,
    ) -> Result<ConstructionActivity, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CONSTRUCTION).await?;
        let status = new.status.unwrap_or(ConstructionStatus::NotStarted);

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO construction_activities ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                libsql::params![
                    id.as_str(),
                    new.project_id.as_str(),
                    new.name.trim(),
                    new.phase.map(|p| p.as_str()),
                    status.as_str(),
                    new.progress_percent,
                    new.start_date.map(format_date),
                    new.end_date.map(format_date),
                    new.notes.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::ConstructionActivity,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "project_id": new.project_id })),
        )
        .await?;

        Ok(ConstructionActivity {
            id,
            project_id: new.project_id.clone(),
            name: new.name.trim().to_string(),
            phase: new.phase,
            status,
            progress_percent: new.progress_percent,
            start_date: new.start_date,
            end_date: new.end_date,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no activity has this id.
    pub async fn get_construction_activity(
        &self,
        id: &str,
    ) -> Result<ConstructionActivity, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM construction_activities WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::ConstructionActivity, id))?;
        row_to_activity(&row)
    }

    /// All activities, or those of one project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_construction_activities(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<ConstructionActivity>, DatabaseError> {
        let mut rows = match project_id {
            Some(project_id) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM construction_activities
                             WHERE project_id = ?1 ORDER BY start_date, name"
                        ),
                        [project_id],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM construction_activities
                             ORDER BY project_id, start_date, name"
                        ),
                        (),
                    )
                    .await?
            }
        };
        let mut activities = Vec::new();
        while let Some(row) = rows.next().await? {
            activities.push(row_to_activity(&row)?);
        }
        Ok(activities)
    }

    /// # Errors
    ///
    /// `NotFound` or validation of the merged record.
    pub async fn update_construction_activity(
        &self,
        actor: Option<&str>,
        id: &str,
        update: ConstructionActivityUpdate,
    ) -> Result<ConstructionActivity, DatabaseError> {
        let _gate = self.write_lock().await;
        let current = self.get_construction_activity(id).await?;

        if let Some(ref name) = update.name {
            non_empty("name", name)?;
        }
        if let Some(progress) = update.progress_percent {
            percent("progress_percent", progress)?;
        }
        date_order(
            "start_date",
            update.start_date.unwrap_or(current.start_date),
            "end_date",
            update.end_date.unwrap_or(current.end_date),
        )?;

        let mut set = UpdateSet::new();
        if let Some(ref name) = update.name {
            set.set("name", name.trim());
        }
        if let Some(phase) = update.phase {
            set.set_nullable("phase", phase.map(|p| p.as_str()));
        }
        if let Some(status) = update.status {
            set.set("status", status.as_str());
        }
        if let Some(progress) = update.progress_percent {
            set.set("progress_percent", progress);
        }
        if let Some(start_date) = update.start_date {
            set.set_nullable("start_date", start_date.map(format_date));
        }
        if let Some(end_date) = update.end_date {
            set.set_nullable("end_date", end_date.map(format_date));
        }
        if let Some(ref notes) = update.notes {
            set.set_nullable("notes", notes.clone());
        }
        if set.is_empty() {
            return Ok(current);
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("construction_activities", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;

        let action = match update.status {
            Some(status) if status != current.status => ActivityAction::StatusChanged,
            _ => ActivityAction::Updated,
        };
        self.log_activity(
            actor,
            EntityType::ConstructionActivity,
            id,
            action,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_construction_activity(id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no activity has this id.
    pub async fn delete_construction_activity(
        &self,
        actor: Option<&str>,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM construction_activities WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::ConstructionActivity, id));
        }
        self.log_activity(
            actor,
            EntityType::ConstructionActivity,
            id,
            ActivityAction::Deleted,
            None,
        )
        .await?;
        Ok(())
    }
}

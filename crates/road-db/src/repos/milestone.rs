//! Project milestone repository.

use chrono::Utc;

use road_core::entities::checks::non_empty;
use road_core::entities::{NewMilestone, ProjectMilestone};
use road_core::enums::{ActivityAction, EntityType, MilestoneStatus};
use road_core::ids::PREFIX_MILESTONE;

use crate::error::DatabaseError;
use crate::helpers::{
    UpdateSet, format_date, get_opt_string, parse_datetime, parse_enum, parse_optional_date,
    parse_optional_datetime,
};
use crate::service::RoadService;
use crate::updates::milestone::MilestoneUpdate;

const SELECT_COLS: &str =
    "id, project_id, title, description, due_date, status, completed_at, created_at, updated_at";

fn row_to_milestone(row: &libsql::Row) -> Result<ProjectMilestone, DatabaseError> {
    Ok(ProjectMilestone {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        due_date: parse_optional_date(get_opt_string(row, 4)?.as_deref())?,
        status: parse_enum(&row.get::<String>(5)?)?,
        completed_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_milestone(
        &self,
        actor: Option<&str>,
        new: &NewMilestone,
    ) -> Result<ProjectMilestone, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_MILESTONE).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO milestones ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)"
                ),
                libsql::params![
                    id.as_str(),
                    new.project_id.as_str(),
                    new.title.trim(),
                    new.description.as_deref(),
                    new.due_date.map(format_date),
                    MilestoneStatus::Pending.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Milestone,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "project_id": new.project_id })),
        )
        .await?;

        Ok(ProjectMilestone {
            id,
            project_id: new.project_id.clone(),
            title: new.title.trim().to_string(),
            description: new.description.clone(),
            due_date: new.due_date,
            status: MilestoneStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no milestone has this id.
    pub async fn get_milestone(&self, id: &str) -> Result<ProjectMilestone, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM milestones WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Milestone, id))?;
        row_to_milestone(&row)
    }

    /// Milestones ordered by due date, undated last.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_milestones(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<ProjectMilestone>, DatabaseError> {
        let (where_clause, params): (&str, Vec<libsql::Value>) = match project_id {
            Some(project_id) => ("WHERE project_id = ?1", vec![project_id.into()]),
            None => ("", Vec::new()),
        };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM milestones {where_clause}
                     ORDER BY due_date IS NULL, due_date, created_at"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut milestones = Vec::new();
        while let Some(row) = rows.next().await? {
            milestones.push(row_to_milestone(&row)?);
        }
        Ok(milestones)
    }

    /// # Errors
    ///
    /// `NotFound` or validation errors.
    pub async fn update_milestone(
        &self,
        actor: Option<&str>,
        id: &str,
        update: MilestoneUpdate,
    ) -> Result<ProjectMilestone, DatabaseError> {
        if let Some(ref title) = update.title {
            non_empty("title", title)?;
        }
        let _gate = self.write_lock().await;
        let current = self.get_milestone(id).await?;
        let now = Utc::now();

        let mut set = UpdateSet::new();
        if let Some(ref title) = update.title {
            set.set("title", title.trim());
        }
        if let Some(ref description) = update.description {
            set.set_nullable("description", description.clone());
        }
        if let Some(due_date) = update.due_date {
            set.set_nullable("due_date", due_date.map(format_date));
        }
        if let Some(status) = update.status {
            set.set("status", status.as_str());
            if status != current.status {
                let completed_at = (status == MilestoneStatus::Completed).then(|| now.to_rfc3339());
                set.set_nullable("completed_at", completed_at);
            }
        }
        if set.is_empty() {
            return Ok(current);
        }
        set.set("updated_at", now.to_rfc3339());

        let (sql, params) = set.into_statement("milestones", "id", id);
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
            EntityType::Milestone,
            id,
            action,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_milestone(id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no milestone has this id.
    pub async fn delete_milestone(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM milestones WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Milestone, id));
        }
        self.log_activity(actor, EntityType::Milestone, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

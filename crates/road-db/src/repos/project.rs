//! Project and road section repository, with status transitions.

use chrono::Utc;

use road_core::entities::{NewProject, NewSection, Project, RoadSection};
use road_core::enums::{ActivityAction, EntityType, ProjectStatus};
use road_core::errors::CoreError;
use road_core::ids::{PREFIX_PROJECT, PREFIX_SECTION};

use crate::error::DatabaseError;
use crate::helpers::{
    UpdateSet, format_date, get_opt_f64, get_opt_string, parse_datetime, parse_enum,
    parse_optional_date,
};
use crate::service::RoadService;
use crate::updates::project::ProjectUpdate;

const SELECT_COLS: &str = "id, name, description, province_id, status, start_date, end_date, \
     budget, length_km, created_by, created_at, updated_at";

const SECTION_COLS: &str = "id, project_id, name, start_chainage_km, end_chainage_km, created_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: get_opt_string(row, 2)?,
        province_id: get_opt_string(row, 3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        start_date: parse_optional_date(get_opt_string(row, 5)?.as_deref())?,
        end_date: parse_optional_date(get_opt_string(row, 6)?.as_deref())?,
        budget: get_opt_f64(row, 7)?,
        length_km: get_opt_f64(row, 8)?,
        created_by: get_opt_string(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

fn row_to_section(row: &libsql::Row) -> Result<RoadSection, DatabaseError> {
    Ok(RoadSection {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        start_chainage_km: row.get(3)?,
        end_chainage_km: row.get(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Filter criteria for project listings.
#[derive(Debug, Default)]
pub struct ProjectFilter {
    pub province_id: Option<String>,
    pub status: Option<ProjectStatus>,
}

fn check_transition(
    id: &str,
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), DatabaseError> {
    if from != to && !from.can_transition_to(to) {
        return Err(CoreError::InvalidTransition {
            entity_type: EntityType::Project.to_string(),
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
        .into());
    }
    Ok(())
}

impl RoadService {
    /// # Errors
    ///
    /// Validation errors, or a FOREIGN KEY violation for an unknown province.
    pub async fn create_project(
        &self,
        actor: Option<&str>,
        new: &NewProject,
    ) -> Result<Project, DatabaseError> {
        new.validate()?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PROJECT).await?;
        let status = new.status.unwrap_or(ProjectStatus::Planning);

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO projects ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                libsql::params![
                    id.as_str(),
                    new.name.trim(),
                    new.description.as_deref(),
                    new.province_id.as_deref(),
                    status.as_str(),
                    new.start_date.map(format_date),
                    new.end_date.map(format_date),
                    new.budget,
                    new.length_km,
                    actor,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        let project = Project {
            id: id.clone(),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            province_id: new.province_id.clone(),
            status,
            start_date: new.start_date,
            end_date: new.end_date,
            budget: new.budget,
            length_km: new.length_km,
            created_by: actor.map(String::from),
            created_at: now,
            updated_at: now,
        };

        self.log_activity(
            actor,
            EntityType::Project,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "name": project.name })),
        )
        .await?;
        tracing::info!(project_id = %id, name = %project.name, "project created");
        Ok(project)
    }

    /// # Errors
    ///
    /// `NotFound` when no project has this id.
    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Project, id))?;
        row_to_project(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref province_id) = filter.province_id {
            params.push(province_id.as_str().into());
            conditions.push(format!("province_id = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects {where_clause} ORDER BY name"),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// Apply a partial update. A status change must follow the project state
    /// machine and is logged as `status_changed`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, or validation of the merged record.
    pub async fn update_project(
        &self,
        actor: Option<&str>,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<Project, DatabaseError> {
        let _gate = self.write_lock().await;
        let current = self.get_project(id).await?;

        let merged = NewProject {
            name: update.name.clone().unwrap_or_else(|| current.name.clone()),
            description: update
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            province_id: update
                .province_id
                .clone()
                .unwrap_or_else(|| current.province_id.clone()),
            status: Some(update.status.unwrap_or(current.status)),
            start_date: update.start_date.unwrap_or(current.start_date),
            end_date: update.end_date.unwrap_or(current.end_date),
            budget: update.budget.unwrap_or(current.budget),
            length_km: update.length_km.unwrap_or(current.length_km),
        };
        merged.validate()?;
        if let Some(status) = update.status {
            check_transition(id, current.status, status)?;
        }

        let mut set = UpdateSet::new();
        if let Some(ref name) = update.name {
            set.set("name", name.trim());
        }
        if let Some(ref description) = update.description {
            set.set_nullable("description", description.clone());
        }
        if let Some(ref province_id) = update.province_id {
            set.set_nullable("province_id", province_id.clone());
        }
        if let Some(status) = update.status {
            set.set("status", status.as_str());
        }
        if let Some(start_date) = update.start_date {
            set.set_nullable("start_date", start_date.map(format_date));
        }
        if let Some(end_date) = update.end_date {
            set.set_nullable("end_date", end_date.map(format_date));
        }
        if let Some(budget) = update.budget {
            set.set_nullable("budget", budget);
        }
        if let Some(length_km) = update.length_km {
            set.set_nullable("length_km", length_km);
        }
        if set.is_empty() {
            return Ok(current);
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("projects", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;

        let mut detail = serde_json::to_value(&update)?;
        let action = match update.status {
            Some(to) if to != current.status => {
                detail["from"] = serde_json::Value::String(current.status.as_str().into());
                ActivityAction::StatusChanged
            }
            _ => ActivityAction::Updated,
        };
        self.log_activity(actor, EntityType::Project, id, action, Some(detail))
            .await?;
        self.get_project(id).await
    }

    /// Move a project to a new status.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidTransition`.
    pub async fn transition_project(
        &self,
        actor: Option<&str>,
        id: &str,
        status: ProjectStatus,
    ) -> Result<Project, DatabaseError> {
        self.update_project(
            actor,
            id,
            ProjectUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a project and, by cascade, everything recorded against it.
    ///
    /// # Errors
    ///
    /// `NotFound` when no project has this id.
    pub async fn delete_project(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Project, id));
        }
        self.log_activity(actor, EntityType::Project, id, ActivityAction::Deleted, None)
            .await?;
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }

    // -- sections --

    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_section(
        &self,
        actor: Option<&str>,
        project_id: &str,
        new: &NewSection,
    ) -> Result<RoadSection, DatabaseError> {
        new.validate()?;
        self.get_project(project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SECTION).await?;

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO road_sections ({SECTION_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    id.as_str(),
                    project_id,
                    new.name.trim(),
                    new.start_chainage_km,
                    new.end_chainage_km,
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Section,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "project_id": project_id })),
        )
        .await?;

        Ok(RoadSection {
            id,
            project_id: project_id.to_string(),
            name: new.name.trim().to_string(),
            start_chainage_km: new.start_chainage_km,
            end_chainage_km: new.end_chainage_km,
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no section has this id.
    pub async fn get_section(&self, id: &str) -> Result<RoadSection, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SECTION_COLS} FROM road_sections WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Section, id))?;
        row_to_section(&row)
    }

    /// Sections of a project ordered by chainage.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sections(&self, project_id: &str) -> Result<Vec<RoadSection>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SECTION_COLS} FROM road_sections WHERE project_id = ?1
                     ORDER BY start_chainage_km"
                ),
                [project_id],
            )
            .await?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next().await? {
            sections.push(row_to_section(&row)?);
        }
        Ok(sections)
    }

    /// Delete a section. GPS points in it keep existing with no section.
    ///
    /// # Errors
    ///
    /// `NotFound` when no section has this id.
    pub async fn delete_section(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM road_sections WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Section, id));
        }
        self.log_activity(actor, EntityType::Section, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

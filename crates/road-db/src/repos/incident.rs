//! HSE incident repository, with status transitions.

use chrono::Utc;

use road_core::entities::checks::non_empty;
use road_core::entities::{HseIncident, NewIncident};
use road_core::enums::{ActivityAction, EntityType, IncidentStatus};
use road_core::errors::CoreError;
use road_core::ids::PREFIX_INCIDENT;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, get_opt_f64, get_opt_string, parse_datetime, parse_enum};
use crate::service::RoadService;
use crate::updates::incident::IncidentUpdate;

const SELECT_COLS: &str = "id, project_id, title, description, severity, status, occurred_at, \
     latitude, longitude, reported_by, created_at, updated_at";

fn row_to_incident(row: &libsql::Row) -> Result<HseIncident, DatabaseError> {
    Ok(HseIncident {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        severity: parse_enum(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        occurred_at: parse_datetime(&row.get::<String>(6)?)?,
        latitude: get_opt_f64(row, 7)?,
        longitude: get_opt_f64(row, 8)?,
        reported_by: get_opt_string(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

/// Filter criteria for incident listings.
#[derive(Debug, Default)]
pub struct IncidentFilter {
    pub project_id: Option<String>,
    pub status: Option<IncidentStatus>,
}

impl RoadService {
    /// Report an incident. New incidents start `open`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or validation errors.
    pub async fn create_incident(
        &self,
        actor: Option<&str>,
        new: &NewIncident,
    ) -> Result<HseIncident, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_INCIDENT).await?;
        let occurred_at = new.occurred_at.unwrap_or(now);

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO hse_incidents ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                libsql::params![
                    id.as_str(),
                    new.project_id.as_str(),
                    new.title.trim(),
                    new.description.as_deref(),
                    new.severity.as_str(),
                    IncidentStatus::Open.as_str(),
                    occurred_at.to_rfc3339(),
                    new.latitude,
                    new.longitude,
                    actor,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Incident,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({
                "project_id": new.project_id,
                "severity": new.severity,
            })),
        )
        .await?;
        tracing::info!(incident_id = %id, severity = %new.severity, "incident reported");

        Ok(HseIncident {
            id,
            project_id: new.project_id.clone(),
            title: new.title.trim().to_string(),
            description: new.description.clone(),
            severity: new.severity,
            status: IncidentStatus::Open,
            occurred_at,
            latitude: new.latitude,
            longitude: new.longitude,
            reported_by: actor.map(String::from),
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no incident has this id.
    pub async fn get_incident(&self, id: &str) -> Result<HseIncident, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM hse_incidents WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Incident, id))?;
        row_to_incident(&row)
    }

    /// Incidents matching the filter, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_incidents(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<HseIncident>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref project_id) = filter.project_id {
            params.push(project_id.as_str().into());
            conditions.push(format!("project_id = ?{}", params.len()));
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
                &format!(
                    "SELECT {SELECT_COLS} FROM hse_incidents {where_clause} ORDER BY occurred_at DESC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(row_to_incident(&row)?);
        }
        Ok(incidents)
    }

    /// Apply a partial update. A status change must follow the incident state
    /// machine.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, or validation errors.
    pub async fn update_incident(
        &self,
        actor: Option<&str>,
        id: &str,
        update: IncidentUpdate,
    ) -> Result<HseIncident, DatabaseError> {
        if let Some(ref title) = update.title {
            non_empty("title", title)?;
        }
        let _gate = self.write_lock().await;
        let current = self.get_incident(id).await?;
        if let Some(to) = update.status {
            if to != current.status && !current.status.can_transition_to(to) {
                return Err(CoreError::InvalidTransition {
                    entity_type: EntityType::Incident.to_string(),
                    id: id.to_string(),
                    from: current.status.to_string(),
                    to: to.to_string(),
                }
                .into());
            }
        }

        let mut set = UpdateSet::new();
        if let Some(ref title) = update.title {
            set.set("title", title.trim());
        }
        if let Some(ref description) = update.description {
            set.set_nullable("description", description.clone());
        }
        if let Some(severity) = update.severity {
            set.set("severity", severity.as_str());
        }
        if let Some(status) = update.status {
            set.set("status", status.as_str());
        }
        if set.is_empty() {
            return Ok(current);
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("hse_incidents", "id", id);
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
        self.log_activity(actor, EntityType::Incident, id, action, Some(detail))
            .await?;
        self.get_incident(id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no incident has this id.
    pub async fn delete_incident(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM hse_incidents WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Incident, id));
        }
        self.log_activity(actor, EntityType::Incident, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

//! Contractor repository and project assignments.

use chrono::Utc;

use road_core::entities::checks::non_empty;
use road_core::entities::{
    AssignContractor, Contractor, NewContractor, ProjectContractor, validate_email,
};
use road_core::enums::{ActivityAction, EntityType};
use road_core::errors::CoreError;
use road_core::ids::PREFIX_CONTRACTOR;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, get_opt_string, parse_datetime};
use crate::service::RoadService;
use crate::updates::contractor::ContractorUpdate;

const SELECT_COLS: &str =
    "id, name, license_number, contact_email, contact_phone, address, created_at, updated_at";

fn row_to_contractor(row: &libsql::Row) -> Result<Contractor, DatabaseError> {
    Ok(Contractor {
        id: row.get(0)?,
        name: row.get(1)?,
        license_number: row.get(2)?,
        contact_email: get_opt_string(row, 3)?,
        contact_phone: get_opt_string(row, 4)?,
        address: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// Validation errors, or a UNIQUE violation on `license_number`.
    pub async fn create_contractor(
        &self,
        actor: Option<&str>,
        new: &NewContractor,
    ) -> Result<Contractor, DatabaseError> {
        new.validate()?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CONTRACTOR).await?;

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO contractors ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                libsql::params![
                    id.as_str(),
                    new.name.trim(),
                    new.license_number.trim(),
                    new.contact_email.as_deref(),
                    new.contact_phone.as_deref(),
                    new.address.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(actor, EntityType::Contractor, &id, ActivityAction::Created, None)
            .await?;

        Ok(Contractor {
            id,
            name: new.name.trim().to_string(),
            license_number: new.license_number.trim().to_string(),
            contact_email: new.contact_email.clone(),
            contact_phone: new.contact_phone.clone(),
            address: new.address.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no contractor has this id.
    pub async fn get_contractor(&self, id: &str) -> Result<Contractor, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM contractors WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Contractor, id))?;
        row_to_contractor(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_contractors(&self) -> Result<Vec<Contractor>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM contractors ORDER BY name"),
                (),
            )
            .await?;
        let mut contractors = Vec::new();
        while let Some(row) = rows.next().await? {
            contractors.push(row_to_contractor(&row)?);
        }
        Ok(contractors)
    }

    /// # Errors
    ///
    /// `NotFound`, validation errors, or a UNIQUE violation on `license_number`.
    pub async fn update_contractor(
        &self,
        actor: Option<&str>,
        id: &str,
        update: ContractorUpdate,
    ) -> Result<Contractor, DatabaseError> {
        if let Some(ref name) = update.name {
            non_empty("name", name)?;
        }
        if let Some(ref license) = update.license_number {
            non_empty("license_number", license)?;
        }
        if let Some(Some(ref email)) = update.contact_email {
            validate_email(email)?;
        }
        let _gate = self.write_lock().await;
        self.get_contractor(id).await?;

        let mut set = UpdateSet::new();
        if let Some(ref name) = update.name {
            set.set("name", name.trim());
        }
        if let Some(ref license) = update.license_number {
            set.set("license_number", license.trim());
        }
        if let Some(ref email) = update.contact_email {
            set.set_nullable("contact_email", email.clone());
        }
        if let Some(ref phone) = update.contact_phone {
            set.set_nullable("contact_phone", phone.clone());
        }
        if let Some(ref address) = update.address {
            set.set_nullable("address", address.clone());
        }
        if set.is_empty() {
            return self.get_contractor(id).await;
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("contractors", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.log_activity(
            actor,
            EntityType::Contractor,
            id,
            ActivityAction::Updated,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_contractor(id).await
    }

    /// Delete a contractor and its project assignments.
    ///
    /// # Errors
    ///
    /// `NotFound` when no contractor has this id.
    pub async fn delete_contractor(
        &self,
        actor: Option<&str>,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM contractors WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Contractor, id));
        }
        self.log_activity(actor, EntityType::Contractor, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }

    // -- project assignments --

    /// Assign a contractor to a project.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project or contractor, or a UNIQUE violation
    /// when the pair is already assigned.
    pub async fn assign_contractor(
        &self,
        actor: Option<&str>,
        project_id: &str,
        assignment: &AssignContractor,
    ) -> Result<ProjectContractor, DatabaseError> {
        self.get_project(project_id).await?;
        self.get_contractor(&assignment.contractor_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();

        self.db()
            .conn()
            .execute(
                "INSERT INTO project_contractors (project_id, contractor_id, contract_role, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    project_id,
                    assignment.contractor_id.as_str(),
                    assignment.contract_role.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Project,
            project_id,
            ActivityAction::Updated,
            Some(serde_json::json!({
                "contractor_assigned": assignment.contractor_id,
                "contract_role": assignment.contract_role,
            })),
        )
        .await?;

        Ok(ProjectContractor {
            project_id: project_id.to_string(),
            contractor_id: assignment.contractor_id.clone(),
            contract_role: assignment.contract_role.clone(),
            assigned_at: now,
        })
    }

    /// Contractors assigned to a project, with their assignment.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_project_contractors(
        &self,
        project_id: &str,
    ) -> Result<Vec<(Contractor, ProjectContractor)>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT c.id, c.name, c.license_number, c.contact_email, c.contact_phone,
                        c.address, c.created_at, c.updated_at, pc.contract_role, pc.assigned_at
                 FROM project_contractors pc
                 JOIN contractors c ON c.id = pc.contractor_id
                 WHERE pc.project_id = ?1
                 ORDER BY c.name",
                [project_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let contractor = row_to_contractor(&row)?;
            let assignment = ProjectContractor {
                project_id: project_id.to_string(),
                contractor_id: contractor.id.clone(),
                contract_role: get_opt_string(&row, 8)?,
                assigned_at: parse_datetime(&row.get::<String>(9)?)?,
            };
            out.push((contractor, assignment));
        }
        Ok(out)
    }

    /// # Errors
    ///
    /// `NotFound` when the contractor is not assigned to the project.
    pub async fn unassign_contractor(
        &self,
        actor: Option<&str>,
        project_id: &str,
        contractor_id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute(
                "DELETE FROM project_contractors WHERE project_id = ?1 AND contractor_id = ?2",
                [project_id, contractor_id],
            )
            .await?;
        if affected == 0 {
            return Err(CoreError::NotFound {
                entity_type: "project_contractor".into(),
                id: format!("{project_id}/{contractor_id}"),
            }
            .into());
        }
        self.log_activity(
            actor,
            EntityType::Project,
            project_id,
            ActivityAction::Updated,
            Some(serde_json::json!({ "contractor_unassigned": contractor_id })),
        )
        .await?;
        Ok(())
    }
}

//! Province repository.

use chrono::Utc;

use road_core::entities::checks::non_empty;
use road_core::entities::{NewProvince, Province};
use road_core::enums::{ActivityAction, EntityType};
use road_core::ids::PREFIX_PROVINCE;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, get_opt_string, parse_datetime};
use crate::service::RoadService;
use crate::updates::province::ProvinceUpdate;

const SELECT_COLS: &str = "id, name, code, region, created_at";

fn row_to_province(row: &libsql::Row) -> Result<Province, DatabaseError> {
    Ok(Province {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        region: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// Validation errors, or a UNIQUE violation on `code`.
    pub async fn create_province(
        &self,
        actor: Option<&str>,
        new: &NewProvince,
    ) -> Result<Province, DatabaseError> {
        new.validate()?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PROVINCE).await?;
        let code = new.code.trim().to_uppercase();

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO provinces ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                libsql::params![
                    id.as_str(),
                    new.name.trim(),
                    code.as_str(),
                    new.region.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(actor, EntityType::Province, &id, ActivityAction::Created, None)
            .await?;

        Ok(Province {
            id,
            name: new.name.trim().to_string(),
            code,
            region: new.region.clone(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no province has this id.
    pub async fn get_province(&self, id: &str) -> Result<Province, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM provinces WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Province, id))?;
        row_to_province(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_provinces(&self) -> Result<Vec<Province>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM provinces ORDER BY name"),
                (),
            )
            .await?;
        let mut provinces = Vec::new();
        while let Some(row) = rows.next().await? {
            provinces.push(row_to_province(&row)?);
        }
        Ok(provinces)
    }

    /// # Errors
    ///
    /// `NotFound`, validation errors, or a UNIQUE violation on `code`.
    pub async fn update_province(
        &self,
        actor: Option<&str>,
        id: &str,
        update: ProvinceUpdate,
    ) -> Result<Province, DatabaseError> {
        if let Some(ref name) = update.name {
            non_empty("name", name)?;
        }
        if let Some(ref code) = update.code {
            non_empty("code", code)?;
        }
        let _gate = self.write_lock().await;
        self.get_province(id).await?;

        let mut set = UpdateSet::new();
        if let Some(ref name) = update.name {
            set.set("name", name.trim());
        }
        if let Some(ref code) = update.code {
            set.set("code", code.trim().to_uppercase());
        }
        if let Some(ref region) = update.region {
            set.set_nullable("region", region.clone());
        }
        if set.is_empty() {
            return self.get_province(id).await;
        }

        let (sql, params) = set.into_statement("provinces", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.log_activity(
            actor,
            EntityType::Province,
            id,
            ActivityAction::Updated,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_province(id).await
    }

    /// Delete a province. Projects in it keep existing with no province.
    ///
    /// # Errors
    ///
    /// `NotFound` when no province has this id.
    pub async fn delete_province(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM provinces WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Province, id));
        }
        self.log_activity(actor, EntityType::Province, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use road_core::entities::NewProject;

    fn morobe() -> NewProvince {
        NewProvince {
            name: "Morobe".into(),
            code: "mbp".into(),
            region: Some("Momase".into()),
        }
    }

    #[tokio::test]
    async fn create_normalizes_code() {
        let svc = test_service().await;
        let province = svc.create_province(None, &morobe()).await.unwrap();
        assert!(province.id.starts_with("prv-"));
        assert_eq!(province.code, "MBP");
        assert_eq!(svc.get_province(&province.id).await.unwrap(), province);
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let svc = test_service().await;
        svc.create_province(None, &morobe()).await.unwrap();
        let err = svc.create_province(None, &morobe()).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn update_clears_region() {
        let svc = test_service().await;
        let province = svc.create_province(None, &morobe()).await.unwrap();
        let updated = svc
            .update_province(
                None,
                &province.id,
                ProvinceUpdate {
                    region: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.region, None);
        assert_eq!(updated.name, "Morobe");
    }

    #[tokio::test]
    async fn delete_detaches_projects() {
        let svc = test_service().await;
        let province = svc.create_province(None, &morobe()).await.unwrap();
        let project = svc
            .create_project(
                None,
                &NewProject {
                    name: "Highlands Highway".into(),
                    province_id: Some(province.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        svc.delete_province(None, &province.id).await.unwrap();
        let project = svc.get_project(&project.id).await.unwrap();
        assert_eq!(project.province_id, None);
    }
}

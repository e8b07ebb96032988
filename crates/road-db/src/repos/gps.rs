//! GPS point and photo repository.

use chrono::{DateTime, Utc};

use road_core::entities::checks::{non_negative, opt_non_negative};
use road_core::entities::{GpsPhoto, GpsPoint, NewGpsPhoto, NewGpsPoint, validate_coordinates};
use road_core::enums::{ActivityAction, EntityType, Phase, RoadSide};
use road_core::errors::CoreError;
use road_core::ids::{PREFIX_GPS_POINT, PREFIX_PHOTO};

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, get_opt_f64, get_opt_string, parse_datetime, parse_enum};
use crate::service::RoadService;
use crate::updates::gps::GpsPointUpdate;

pub(crate) const SELECT_COLS: &str = "id, project_id, section_id, phase, side, latitude, longitude, \
     distance, notes, elevation, accuracy, recorded_by, recorded_at, created_at";

const PHOTO_COLS: &str = "id, gps_point_id, url, caption, created_at";

pub(crate) fn row_to_gps_point(row: &libsql::Row) -> Result<GpsPoint, DatabaseError> {
    Ok(GpsPoint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        section_id: get_opt_string(row, 2)?,
        phase: parse_enum(&row.get::<String>(3)?)?,
        side: parse_enum(&row.get::<String>(4)?)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        distance: row.get(7)?,
        notes: get_opt_string(row, 8)?,
        elevation: get_opt_f64(row, 9)?,
        accuracy: get_opt_f64(row, 10)?,
        recorded_by: get_opt_string(row, 11)?,
        recorded_at: parse_datetime(&row.get::<String>(12)?)?,
        created_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

fn row_to_photo(row: &libsql::Row) -> Result<GpsPhoto, DatabaseError> {
    Ok(GpsPhoto {
        id: row.get(0)?,
        gps_point_id: row.get(1)?,
        url: row.get(2)?,
        caption: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Insert one validated point through `conn`, which may be a transaction.
pub(crate) async fn insert_gps_point(
    conn: &libsql::Connection,
    id: String,
    new: &NewGpsPoint,
    recorded_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<GpsPoint, DatabaseError> {
    let recorded_at = new.recorded_at.unwrap_or(now);
    conn.execute(
        &format!(
            "INSERT INTO gps_points ({SELECT_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        libsql::params![
            id.as_str(),
            new.project_id.as_str(),
            new.section_id.as_deref(),
            new.phase.as_str(),
            new.side.as_str(),
            new.latitude,
            new.longitude,
            new.distance,
            new.notes.as_deref(),
            new.elevation,
            new.accuracy,
            recorded_by,
            recorded_at.to_rfc3339(),
            now.to_rfc3339()
        ],
    )
    .await?;

    Ok(GpsPoint {
        id,
        project_id: new.project_id.clone(),
        section_id: new.section_id.clone(),
        phase: new.phase,
        side: new.side,
        latitude: new.latitude,
        longitude: new.longitude,
        distance: new.distance,
        notes: new.notes.clone(),
        elevation: new.elevation,
        accuracy: new.accuracy,
        recorded_by: recorded_by.map(String::from),
        recorded_at,
        created_at: now,
    })
}

/// Filter criteria for GPS point listings.
#[derive(Debug, Default)]
pub struct GpsFilter {
    pub project_id: Option<String>,
    pub phase: Option<Phase>,
    pub side: Option<RoadSide>,
    pub limit: Option<u32>,
}

impl RoadService {
    /// Record a GPS point.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project or section, or validation errors
    /// (including a section that belongs to another project).
    pub async fn create_gps_point(
        &self,
        actor: Option<&str>,
        new: &NewGpsPoint,
    ) -> Result<GpsPoint, DatabaseError> {
        new.validate()?;
        self.get_project(&new.project_id).await?;
        let _gate = self.write_lock().await;
        if let Some(section_id) = &new.section_id {
            self.ensure_section_in_project(section_id, &new.project_id)
                .await?;
        }
        let id = self.db().generate_id(PREFIX_GPS_POINT).await?;
        let point = insert_gps_point(self.db().conn(), id, new, actor, Utc::now()).await?;

        self.log_activity(
            actor,
            EntityType::GpsPoint,
            &point.id,
            ActivityAction::Created,
            Some(serde_json::json!({
                "project_id": point.project_id,
                "phase": point.phase,
                "side": point.side,
            })),
        )
        .await?;
        Ok(point)
    }

    /// # Errors
    ///
    /// `NotFound` when no point has this id.
    pub async fn get_gps_point(&self, id: &str) -> Result<GpsPoint, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM gps_points WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::GpsPoint, id))?;
        row_to_gps_point(&row)
    }

    /// Points matching the filter, ordered by project then chainage.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_gps_points(&self, filter: &GpsFilter) -> Result<Vec<GpsPoint>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref project_id) = filter.project_id {
            params.push(project_id.as_str().into());
            conditions.push(format!("project_id = ?{}", params.len()));
        }
        if let Some(phase) = filter.phase {
            params.push(phase.as_str().into());
            conditions.push(format!("phase = ?{}", params.len()));
        }
        if let Some(side) = filter.side {
            params.push(side.as_str().into());
            conditions.push(format!("side = ?{}", params.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = filter
            .limit
            .map_or_else(String::new, |limit| format!("LIMIT {limit}"));

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM gps_points {where_clause}
                     ORDER BY project_id, distance, recorded_at {limit_clause}"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut points = Vec::new();
        while let Some(row) = rows.next().await? {
            points.push(row_to_gps_point(&row)?);
        }
        Ok(points)
    }

    /// # Errors
    ///
    /// `NotFound`, or validation of the changed fields. A new section must
    /// belong to the point's project.
    pub async fn update_gps_point(
        &self,
        actor: Option<&str>,
        id: &str,
        update: GpsPointUpdate,
    ) -> Result<GpsPoint, DatabaseError> {
        let _gate = self.write_lock().await;
        let current = self.get_gps_point(id).await?;

        validate_coordinates(
            update.latitude.unwrap_or(current.latitude),
            update.longitude.unwrap_or(current.longitude),
        )?;
        if let Some(distance) = update.distance {
            non_negative("distance", distance)?;
        }
        if let Some(accuracy) = update.accuracy {
            opt_non_negative("accuracy", accuracy)?;
        }
        if let Some(Some(elevation)) = update.elevation {
            if !elevation.is_finite() {
                return Err(CoreError::validation("elevation must be a finite number").into());
            }
        }

        if let Some(Some(section_id)) = &update.section_id {
            self.ensure_section_in_project(section_id, &current.project_id)
                .await?;
        }

        let mut set = UpdateSet::new();
        if let Some(ref section_id) = update.section_id {
            set.set_nullable("section_id", section_id.clone());
        }
        if let Some(phase) = update.phase {
            set.set("phase", phase.as_str());
        }
        if let Some(side) = update.side {
            set.set("side", side.as_str());
        }
        if let Some(latitude) = update.latitude {
            set.set("latitude", latitude);
        }
        if let Some(longitude) = update.longitude {
            set.set("longitude", longitude);
        }
        if let Some(distance) = update.distance {
            set.set("distance", distance);
        }
        if let Some(ref notes) = update.notes {
            set.set_nullable("notes", notes.clone());
        }
        if let Some(elevation) = update.elevation {
            set.set_nullable("elevation", elevation);
        }
        if let Some(accuracy) = update.accuracy {
            set.set_nullable("accuracy", accuracy);
        }
        if let Some(recorded_at) = update.recorded_at {
            set.set("recorded_at", recorded_at.to_rfc3339());
        }
        if set.is_empty() {
            return Ok(current);
        }

        let (sql, params) = set.into_statement("gps_points", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.log_activity(
            actor,
            EntityType::GpsPoint,
            id,
            ActivityAction::Updated,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_gps_point(id).await
    }

    async fn ensure_section_in_project(
        &self,
        section_id: &str,
        project_id: &str,
    ) -> Result<(), DatabaseError> {
        let section = self.get_section(section_id).await?;
        if section.project_id != project_id {
            return Err(CoreError::validation(format!(
                "section {section_id} belongs to project {}, not {project_id}",
                section.project_id
            ))
            .into());
        }
        Ok(())
    }

    /// Delete a point and its photos.
    ///
    /// # Errors
    ///
    /// `NotFound` when no point has this id.
    pub async fn delete_gps_point(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM gps_points WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::GpsPoint, id));
        }
        self.log_activity(actor, EntityType::GpsPoint, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }

    // -- photos --

    /// Attach a photo (an uploaded file URL) to a GPS point.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown point, or validation of the URL.
    pub async fn add_gps_photo(
        &self,
        actor: Option<&str>,
        gps_point_id: &str,
        new: &NewGpsPhoto,
    ) -> Result<GpsPhoto, DatabaseError> {
        if new.url.trim().is_empty() {
            return Err(CoreError::validation("url must not be empty").into());
        }
        self.get_gps_point(gps_point_id).await?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PHOTO).await?;

        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO gps_photos ({PHOTO_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                libsql::params![
                    id.as_str(),
                    gps_point_id,
                    new.url.trim(),
                    new.caption.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Photo,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "gps_point_id": gps_point_id })),
        )
        .await?;

        Ok(GpsPhoto {
            id,
            gps_point_id: gps_point_id.to_string(),
            url: new.url.trim().to_string(),
            caption: new.caption.clone(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_gps_photos(&self, gps_point_id: &str) -> Result<Vec<GpsPhoto>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PHOTO_COLS} FROM gps_photos WHERE gps_point_id = ?1 ORDER BY created_at"
                ),
                [gps_point_id],
            )
            .await?;
        let mut photos = Vec::new();
        while let Some(row) = rows.next().await? {
            photos.push(row_to_photo(&row)?);
        }
        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_test_project, test_service};
    use pretty_assertions::assert_eq;
    use road_core::entities::NewSection;

    async fn section_of(svc: &RoadService, project_id: &str) -> String {
        svc.create_section(
            None,
            project_id,
            &NewSection {
                name: "Km 0-5".into(),
                start_chainage_km: 0.0,
                end_chainage_km: 5.0,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_point(project_id: &str, distance: f64, phase: Phase) -> NewGpsPoint {
        NewGpsPoint {
            project_id: project_id.into(),
            section_id: None,
            phase,
            side: RoadSide::Left,
            latitude: -6.72,
            longitude: 146.99,
            distance,
            notes: None,
            elevation: Some(60.0),
            accuracy: Some(3.5),
            recorded_at: None,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_point() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "GPS road").await;
        let point = svc
            .create_gps_point(Some("usr-eng"), &new_point(&project.id, 120.0, Phase::Drainage))
            .await
            .unwrap();
        assert!(point.id.starts_with("gps-"));
        assert_eq!(point.recorded_by.as_deref(), Some("usr-eng"));

        let fetched = svc.get_gps_point(&point.id).await.unwrap();
        assert_eq!(fetched.distance, 120.0);
        assert_eq!(fetched.elevation, Some(60.0));
        assert_eq!(fetched.phase, Phase::Drainage);
    }

    #[tokio::test]
    async fn point_for_missing_project_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .create_gps_point(None, &new_point("prj-missing", 0.0, Phase::Basket))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_distance() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Ordered road").await;
        for (d, phase) in [(300.0, Phase::Sealing), (100.0, Phase::Sealing), (200.0, Phase::Basket)] {
            svc.create_gps_point(None, &new_point(&project.id, d, phase))
                .await
                .unwrap();
        }

        let sealing = svc
            .list_gps_points(&GpsFilter {
                project_id: Some(project.id.clone()),
                phase: Some(Phase::Sealing),
                ..Default::default()
            })
            .await
            .unwrap();
        let distances: Vec<f64> = sealing.iter().map(|p| p.distance).collect();
        assert_eq!(distances, vec![100.0, 300.0]);
    }

    #[tokio::test]
    async fn update_rejects_bad_coordinates() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Update road").await;
        let point = svc
            .create_gps_point(None, &new_point(&project.id, 10.0, Phase::Drainage))
            .await
            .unwrap();

        let err = svc
            .update_gps_point(
                None,
                &point.id,
                GpsPointUpdate {
                    latitude: Some(95.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));

        let updated = svc
            .update_gps_point(
                None,
                &point.id,
                GpsPointUpdate {
                    notes: Some(Some("Culvert installed".into())),
                    elevation: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("Culvert installed"));
        assert_eq!(updated.elevation, None);
    }

    #[tokio::test]
    async fn photos_attach_and_cascade() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Photo road").await;
        let point = svc
            .create_gps_point(None, &new_point(&project.id, 10.0, Phase::Basket))
            .await
            .unwrap();

        let photo = svc
            .add_gps_photo(
                None,
                &point.id,
                &NewGpsPhoto {
                    url: "/uploads/abc.jpg".into(),
                    caption: Some("Basket row 3".into()),
                },
            )
            .await
            .unwrap();
        assert!(photo.id.starts_with("pho-"));
        assert_eq!(svc.list_gps_photos(&point.id).await.unwrap().len(), 1);

        svc.delete_gps_point(None, &point.id).await.unwrap();
        assert!(svc.list_gps_photos(&point.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn point_accepts_a_section_of_its_own_project() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Sectioned road").await;
        let section_id = section_of(&svc, &project.id).await;

        let mut new = new_point(&project.id, 50.0, Phase::Drainage);
        new.section_id = Some(section_id.clone());
        let point = svc.create_gps_point(None, &new).await.unwrap();
        assert_eq!(point.section_id.as_deref(), Some(section_id.as_str()));
    }

    #[tokio::test]
    async fn point_rejects_a_section_of_another_project() {
        let svc = test_service().await;
        let project_a = create_test_project(&svc, "Road A").await;
        let project_b = create_test_project(&svc, "Road B").await;
        let foreign_section = section_of(&svc, &project_b.id).await;

        let mut new = new_point(&project_a.id, 50.0, Phase::Drainage);
        new.section_id = Some(foreign_section.clone());
        let err = svc.create_gps_point(None, &new).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
        assert!(
            svc.list_gps_points(&GpsFilter {
                project_id: Some(project_a.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap()
            .is_empty()
        );

        let point = svc
            .create_gps_point(None, &new_point(&project_a.id, 60.0, Phase::Basket))
            .await
            .unwrap();
        let err = svc
            .update_gps_point(
                None,
                &point.id,
                GpsPointUpdate {
                    section_id: Some(Some(foreign_section)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
        assert_eq!(svc.get_gps_point(&point.id).await.unwrap().section_id, None);
    }

    #[tokio::test]
    async fn unknown_section_is_not_found() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Lonely road").await;
        let mut new = new_point(&project.id, 5.0, Phase::Sealing);
        new.section_id = Some("sec-missing".into());
        let err = svc.create_gps_point(None, &new).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::NotFound { .. })));
    }
}

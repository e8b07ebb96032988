//! CSV import and export of a project's GPS points.
//!
//! The column layout is fixed: `phase, side, latitude, longitude, distance,
//! notes, elevation, accuracy`. Import requires the header row. Optional
//! columns may be left empty.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use road_core::entities::{GpsPoint, NewGpsPoint};
use road_core::enums::{ActivityAction, EntityType, Phase, RoadSide};
use road_core::ids::PREFIX_GPS_POINT;

use crate::error::DatabaseError;
use crate::repos::activity::insert_activity;
use crate::repos::gps::{GpsFilter, insert_gps_point};
use crate::service::RoadService;

/// Header row, in column order.
pub const GPS_CSV_COLUMNS: [&str; 8] = [
    "phase",
    "side",
    "latitude",
    "longitude",
    "distance",
    "notes",
    "elevation",
    "accuracy",
];

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV header mismatch: expected {expected}, found {found}")]
    Header { expected: String, found: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<libsql::Error> for CsvError {
    fn from(e: libsql::Error) -> Self {
        Self::Database(e.into())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct GpsCsvRow {
    phase: String,
    side: String,
    latitude: f64,
    longitude: f64,
    distance: f64,
    notes: Option<String>,
    elevation: Option<f64>,
    accuracy: Option<f64>,
}

impl GpsCsvRow {
    fn from_point(point: &GpsPoint) -> Self {
        Self {
            phase: point.phase.to_string(),
            side: point.side.to_string(),
            latitude: point.latitude,
            longitude: point.longitude,
            distance: point.distance,
            notes: point.notes.clone(),
            elevation: point.elevation,
            accuracy: point.accuracy,
        }
    }

    fn into_new_point(self, project_id: &str) -> Result<NewGpsPoint, DatabaseError> {
        let new = NewGpsPoint {
            project_id: project_id.to_string(),
            section_id: None,
            phase: self.phase.parse::<Phase>()?,
            side: self.side.parse::<RoadSide>()?,
            latitude: self.latitude,
            longitude: self.longitude,
            distance: self.distance,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            elevation: self.elevation,
            accuracy: self.accuracy,
            recorded_at: None,
        };
        new.validate()?;
        Ok(new)
    }
}

/// A data row that was rejected during import. `row` counts data rows from 1,
/// not including the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of a CSV import.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub imported: Vec<GpsPoint>,
    pub failed: Vec<RowError>,
}

impl ImportReport {
    #[must_use]
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl RoadService {
    /// Render every GPS point of a project as CSV, ordered by distance.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project, or a CSV writer error.
    pub async fn export_gps_csv(&self, project_id: &str) -> Result<String, CsvError> {
        self.get_project(project_id).await?;
        let points = self
            .list_gps_points(&GpsFilter {
                project_id: Some(project_id.to_string()),
                ..Default::default()
            })
            .await?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(GPS_CSV_COLUMNS)?;
        for point in &points {
            writer.serialize(GpsCsvRow::from_point(point))?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Import GPS points from CSV. Every row is validated first; invalid rows
    /// are reported and skipped, and the valid ones are inserted in a single
    /// transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project, `Header` when the header row does
    /// not match [`GPS_CSV_COLUMNS`], or a database error, in which case no
    /// rows are inserted.
    pub async fn import_gps_csv(
        &self,
        actor: Option<&str>,
        project_id: &str,
        data: &[u8],
    ) -> Result<ImportReport, CsvError> {
        self.get_project(project_id).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);
        let headers = reader.headers()?.clone();
        let found: Vec<String> = headers.iter().map(str::to_lowercase).collect();
        if found != GPS_CSV_COLUMNS {
            return Err(CsvError::Header {
                expected: GPS_CSV_COLUMNS.join(","),
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut report = ImportReport::default();
        let mut valid = Vec::new();
        for (index, record) in reader.deserialize::<GpsCsvRow>().enumerate() {
            let row = index + 1;
            let parsed = record
                .map_err(|e| e.to_string())
                .and_then(|r| r.into_new_point(project_id).map_err(|e| e.to_string()));
            match parsed {
                Ok(new) => valid.push(new),
                Err(message) => report.failed.push(RowError { row, message }),
            }
        }

        if valid.is_empty() {
            tracing::info!(project_id, failed = report.failed_count(), "csv import: nothing to insert");
            return Ok(report);
        }

        let _gate = self.write_lock().await;
        let mut ids = Vec::with_capacity(valid.len());
        for _ in &valid {
            ids.push(self.db().generate_id(PREFIX_GPS_POINT).await?);
        }

        let activity = self
            .new_activity(
                actor,
                EntityType::Project,
                project_id,
                ActivityAction::Imported,
                Some(serde_json::json!({
                    "imported": valid.len(),
                    "failed": report.failed_count(),
                })),
            )
            .await?;

        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        for (id, new) in ids.into_iter().zip(&valid) {
            match insert_gps_point(&tx, id, new, actor, now).await {
                Ok(point) => report.imported.push(point),
                Err(e) => {
                    tx.rollback().await?;
                    return Err(e.into());
                }
            }
        }
        // The log entry commits with the points or not at all.
        if let Err(e) = insert_activity(&tx, &activity).await {
            tx.rollback().await?;
            return Err(e.into());
        }
        tx.commit().await?;

        tracing::info!(
            project_id,
            imported = report.imported_count(),
            failed = report.failed_count(),
            "csv import complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::activity::ActivityFilter;
    use crate::test_support::helpers::{create_test_project, test_service};
    use pretty_assertions::assert_eq;

    const HEADER: &str = "phase,side,latitude,longitude,distance,notes,elevation,accuracy\n";

    #[tokio::test]
    async fn import_skips_bad_rows_and_keeps_good_ones() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Highlands Highway").await;
        let body = format!(
            "{HEADER}\
             drainage,left,-6.08,145.39,0,Culvert inlet,1520.5,3\n\
             Basket,RIGHT,-6.09,145.40,120.5,,,\n\
             paving,left,-6.10,145.41,200,,,\n\
             sealing,center,95.0,145.41,300,,,\n\
             sealing,center,-6.11,145.42,not-a-number,,,\n"
        );

        let report = svc
            .import_gps_csv(Some("usr-eng"), &project.id, body.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.imported_count(), 2);
        let failed_rows: Vec<usize> = report.failed.iter().map(|f| f.row).collect();
        assert_eq!(failed_rows, vec![3, 4, 5]);
        assert_eq!(report.imported[1].phase, Phase::Basket);
        assert_eq!(report.imported[1].notes, None);
        assert_eq!(report.imported[0].elevation, Some(1520.5));

        let log = svc
            .query_activity(&ActivityFilter {
                action: Some(ActivityAction::Imported),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].entity_id, project.id);
    }

    #[tokio::test]
    async fn import_requires_header() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Headerless").await;
        let err = svc
            .import_gps_csv(None, &project.id, b"drainage,left,-6.08,145.39,0,,,\n")
            .await
            .unwrap_err();
        assert!(matches!(err, CsvError::Header { .. }));
    }

    #[tokio::test]
    async fn export_orders_by_distance_and_reimports() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Magi Highway").await;
        let body = format!(
            "{HEADER}\
             sealing,right,-9.40,147.20,500,,,\n\
             drainage,left,-9.41,147.21,10,\"Outlet, north side\",,2.5\n"
        );
        svc.import_gps_csv(None, &project.id, body.as_bytes())
            .await
            .unwrap();

        let csv_text = svc.export_gps_csv(&project.id).await.unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(format!("{}\n", lines[0]), HEADER);
        assert!(lines[1].starts_with("drainage,left"));
        assert!(lines[1].contains("\"Outlet, north side\""));
        assert!(lines[2].starts_with("sealing,right"));

        let copy = create_test_project(&svc, "Magi Highway copy").await;
        let report = svc
            .import_gps_csv(None, &copy.id, csv_text.as_bytes())
            .await
            .unwrap();
        assert_eq!(report.imported_count(), 2);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn import_into_unknown_project_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .import_gps_csv(None, "prj-missing", HEADER.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, CsvError::Database(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn failed_activity_write_rolls_back_the_points() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Poreporena Freeway").await;
        svc.db()
            .conn()
            .execute("DROP TABLE activity_log", ())
            .await
            .unwrap();

        let body = format!("{HEADER}drainage,left,-9.44,147.18,0,,,\n");
        let result = svc
            .import_gps_csv(Some("usr-eng"), &project.id, body.as_bytes())
            .await;
        assert!(matches!(result, Err(CsvError::Database(_))));

        let points = svc
            .list_gps_points(&GpsFilter {
                project_id: Some(project.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(points.is_empty());
    }
}

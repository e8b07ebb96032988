//! Per-project dashboard aggregates.

use std::collections::BTreeMap;

use road_core::entities::ProjectStats;
use road_core::enums::IncidentStatus;

use crate::error::DatabaseError;
use crate::helpers::{get_count, get_opt_f64};
use crate::service::RoadService;

impl RoadService {
    /// Group counts for a single table column, scoped to one project.
    async fn grouped_counts(
        &self,
        table: &str,
        column: &str,
        project_id: &str,
    ) -> Result<BTreeMap<String, u64>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {column}, COUNT(*) FROM {table} WHERE project_id = ?1 GROUP BY {column}"
                ),
                [project_id],
            )
            .await?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            counts.insert(row.get::<String>(0)?, get_count(&row, 1)?);
        }
        Ok(counts)
    }

    /// Aggregate GPS, milestone, funding, incident, and report figures for a
    /// project dashboard.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project.
    pub async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, DatabaseError> {
        self.get_project(project_id).await?;

        let gps_points_by_phase = self.grouped_counts("gps_points", "phase", project_id).await?;
        let milestones_by_status = self
            .grouped_counts("milestones", "status", project_id)
            .await?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COALESCE(SUM(amount), 0.0), COALESCE(SUM(disbursed_amount), 0.0)
                 FROM funding WHERE project_id = ?1",
                [project_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let funding_committed: f64 = row.get(0)?;
        let funding_disbursed: f64 = row.get(1)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM hse_incidents
                 WHERE project_id = ?1 AND status IN (?2, ?3)",
                libsql::params![
                    project_id,
                    IncidentStatus::Open.as_str(),
                    IncidentStatus::Investigating.as_str()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let open_incidents = get_count(&row, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT percent_complete FROM progress_reports WHERE project_id = ?1
                 ORDER BY period_end DESC, created_at DESC LIMIT 1",
                [project_id],
            )
            .await?;
        let latest_percent_complete = match rows.next().await? {
            Some(row) => get_opt_f64(&row, 0)?,
            None => None,
        };

        Ok(ProjectStats {
            project_id: project_id.to_string(),
            gps_point_total: gps_points_by_phase.values().sum(),
            gps_points_by_phase,
            milestones_by_status,
            funding_committed,
            funding_disbursed,
            open_incidents,
            latest_percent_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::helpers::{create_test_project, test_service};
    use chrono::NaiveDate;
    use road_core::entities::{NewFunding, NewGpsPoint, NewIncident, NewProgressReport};
    use road_core::enums::{IncidentSeverity, Phase, RoadSide};

    fn point(project_id: &str, phase: Phase, distance: f64) -> NewGpsPoint {
        NewGpsPoint {
            project_id: project_id.into(),
            section_id: None,
            phase,
            side: RoadSide::Left,
            latitude: -9.44,
            longitude: 147.18,
            distance,
            notes: None,
            elevation: None,
            accuracy: None,
            recorded_at: None,
        }
    }

    #[tokio::test]
    async fn empty_project_has_zeroed_stats() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Quiet road").await;
        let stats = svc.project_stats(&project.id).await.unwrap();
        assert_eq!(stats.gps_point_total, 0);
        assert!(stats.gps_points_by_phase.is_empty());
        assert!(stats.funding_committed.abs() < f64::EPSILON);
        assert_eq!(stats.open_incidents, 0);
        assert_eq!(stats.latest_percent_complete, None);
    }

    #[tokio::test]
    async fn stats_aggregate_child_records() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Busy road").await;
        let other = create_test_project(&svc, "Other road").await;

        for (phase, distance) in [(Phase::Drainage, 0.0), (Phase::Drainage, 50.0), (Phase::Sealing, 10.0)] {
            svc.create_gps_point(None, &point(&project.id, phase, distance))
                .await
                .unwrap();
        }
        svc.create_gps_point(None, &point(&other.id, Phase::Basket, 0.0))
            .await
            .unwrap();
        for (amount, disbursed) in [(100.0, 40.0), (50.0, 50.0)] {
            svc.create_funding(
                None,
                &NewFunding {
                    project_id: project.id.clone(),
                    source: "GoPNG".into(),
                    amount,
                    currency: "PGK".into(),
                    disbursed_amount: disbursed,
                    funding_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }
        svc.create_incident(
            None,
            &NewIncident {
                project_id: project.id.clone(),
                title: "Spill".into(),
                description: None,
                severity: IncidentSeverity::Low,
                occurred_at: None,
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();
        svc.create_report(
            None,
            &NewProgressReport {
                project_id: project.id.clone(),
                period_start: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
                summary: "Culverts done".into(),
                percent_complete: 35.0,
            },
        )
        .await
        .unwrap();

        let stats = svc.project_stats(&project.id).await.unwrap();
        assert_eq!(stats.gps_point_total, 3);
        assert_eq!(stats.gps_points_by_phase.get("drainage"), Some(&2));
        assert_eq!(stats.gps_points_by_phase.get("basket"), None);
        assert!((stats.funding_committed - 150.0).abs() < f64::EPSILON);
        assert!((stats.funding_disbursed - 90.0).abs() < f64::EPSILON);
        assert_eq!(stats.open_incidents, 1);
        assert_eq!(stats.latest_percent_complete, Some(35.0));
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let svc = test_service().await;
        assert!(svc.project_stats("prj-missing").await.unwrap_err().is_not_found());
    }
}

//! File-backed integration tests
//!
//! - Data survives closing and reopening the database file
//! - Deleting a project cascades to its field records
//! - The activity log records who did what across repos

use tempfile::TempDir;

use road_core::entities::{NewGpsPoint, NewMilestone, NewProject, NewProvince};
use road_core::enums::{ActivityAction, EntityType, Phase, ProjectStatus, RoadSide};
use road_db::repos::activity::ActivityFilter;
use road_db::repos::gps::GpsFilter;
use road_db::service::RoadService;

fn db_path(dir: &TempDir) -> String {
    dir.path().join("roadtrack.db").to_string_lossy().into_owned()
}

fn gps_point(project_id: &str, distance: f64) -> NewGpsPoint {
    NewGpsPoint {
        project_id: project_id.into(),
        section_id: None,
        phase: Phase::Drainage,
        side: RoadSide::Left,
        latitude: -5.22,
        longitude: 145.79,
        distance,
        notes: None,
        elevation: None,
        accuracy: None,
        recorded_at: None,
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);

    let project_id = {
        let svc = RoadService::new_local(&path).await.unwrap();
        let province = svc
            .create_province(
                None,
                &NewProvince {
                    name: "Madang".into(),
                    code: "mpm".into(),
                    region: Some("Momase".into()),
                },
            )
            .await
            .unwrap();
        let project = svc
            .create_project(
                Some("usr-00000001"),
                &NewProject {
                    name: "Ramu Highway sealing".into(),
                    province_id: Some(province.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        svc.create_gps_point(Some("usr-00000001"), &gps_point(&project.id, 0.0))
            .await
            .unwrap();
        project.id
    };

    let svc = RoadService::new_local(&path).await.unwrap();
    let project = svc.get_project(&project_id).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Planning);
    assert_eq!(project.created_by.as_deref(), Some("usr-00000001"));

    let points = svc
        .list_gps_points(&GpsFilter {
            project_id: Some(project_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(points.len(), 1);

    // Reopening must not duplicate the seeded navigation rows.
    assert_eq!(svc.list_navigation(None).await.unwrap().len(), 8);
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_project_removes_field_records() {
    let svc = RoadService::new_local(":memory:").await.unwrap();
    let project = svc
        .create_project(
            None,
            &NewProject {
                name: "Wewak coastal road".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let point = svc
        .create_gps_point(None, &gps_point(&project.id, 10.0))
        .await
        .unwrap();
    let milestone = svc
        .create_milestone(
            None,
            &NewMilestone {
                project_id: project.id.clone(),
                title: "Bridge abutments".into(),
                description: None,
                due_date: None,
            },
        )
        .await
        .unwrap();

    svc.delete_project(None, &project.id).await.unwrap();

    assert!(svc.get_gps_point(&point.id).await.unwrap_err().is_not_found());
    assert!(
        svc.get_milestone(&milestone.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn activity_log_tracks_actor_across_repos() {
    let svc = RoadService::new_local(":memory:").await.unwrap();
    let project = svc
        .create_project(
            Some("usr-manager1"),
            &NewProject {
                name: "Kokoda track access road".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    svc.transition_project(Some("usr-manager1"), &project.id, ProjectStatus::Active)
        .await
        .unwrap();
    svc.create_gps_point(Some("usr-engineer"), &gps_point(&project.id, 5.0))
        .await
        .unwrap();

    let by_manager = svc
        .query_activity(&ActivityFilter {
            user_id: Some("usr-manager1".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let actions: Vec<ActivityAction> = by_manager.iter().map(|a| a.action).collect();
    assert_eq!(
        actions,
        vec![ActivityAction::StatusChanged, ActivityAction::Created]
    );

    let gps_entries = svc
        .query_activity(&ActivityFilter {
            entity_type: Some(EntityType::GpsPoint),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(gps_entries.len(), 1);
    assert_eq!(gps_entries[0].user_id.as_deref(), Some("usr-engineer"));
}

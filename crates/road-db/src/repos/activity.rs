//! Activity log repository.
//!
//! Append-only entries recording every mutation, with dynamic filtering.

use chrono::Utc;

use road_core::entities::Activity;
use road_core::enums::{ActivityAction, EntityType};
use road_core::ids::PREFIX_ACTIVITY;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::RoadService;

/// Default and maximum number of entries returned by a query.
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 100;
pub const MAX_ACTIVITY_LIMIT: u32 = 1_000;

/// Filter criteria for activity queries.
#[derive(Debug, Default)]
pub struct ActivityFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<ActivityAction>,
    pub limit: Option<u32>,
}

fn row_to_activity(row: &libsql::Row) -> Result<Activity, DatabaseError> {
    Ok(Activity {
        id: row.get::<String>(0)?,
        user_id: get_opt_string(row, 1)?,
        entity_type: parse_enum(&row.get::<String>(2)?)?,
        entity_id: row.get::<String>(3)?,
        action: parse_enum(&row.get::<String>(4)?)?,
        detail: parse_optional_json(get_opt_string(row, 5)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Insert one entry through `conn`, which may be a transaction.
pub(crate) async fn insert_activity(
    conn: &libsql::Connection,
    entry: &Activity,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO activity_log (id, user_id, entity_type, entity_id, action, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        libsql::params![
            entry.id.as_str(),
            entry.user_id.as_deref(),
            entry.entity_type.as_str(),
            entry.entity_id.as_str(),
            entry.action.as_str(),
            entry.detail.as_ref().map(std::string::ToString::to_string).as_deref(),
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

impl RoadService {
    /// Append an activity entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_activity(&self, entry: &Activity) -> Result<(), DatabaseError> {
        insert_activity(self.db().conn(), entry).await
    }

    /// Build an entry with a fresh id, without writing it.
    pub(crate) async fn new_activity(
        &self,
        actor: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: ActivityAction,
        detail: Option<serde_json::Value>,
    ) -> Result<Activity, DatabaseError> {
        Ok(Activity {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            user_id: actor.map(String::from),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        })
    }

    /// Build and append an entry for a mutation. Called by every mutation method.
    pub(crate) async fn log_activity(
        &self,
        actor: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: ActivityAction,
        detail: Option<serde_json::Value>,
    ) -> Result<Activity, DatabaseError> {
        let entry = self
            .new_activity(actor, entity_type, entity_id, action, detail)
            .await?;
        self.append_activity(&entry).await?;
        tracing::debug!(
            entity_type = %entity_type,
            entity_id,
            action = %action,
            actor = actor.unwrap_or("system"),
            "activity logged"
        );
        Ok(entry)
    }

    /// Query activity entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_activity(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<Activity>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(ref uid) = filter.user_id {
            params.push(libsql::Value::Text(uid.clone()));
            conditions.push(format!("user_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter
            .limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .min(MAX_ACTIVITY_LIMIT);
        let sql = format!(
            "SELECT id, user_id, entity_type, entity_id, action, detail, created_at
             FROM activity_log {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_activity(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_test_project, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn append_and_filter() {
        let svc = test_service().await;
        svc.log_activity(
            Some("usr-1"),
            EntityType::Project,
            "prj-1",
            ActivityAction::Created,
            None,
        )
        .await
        .unwrap();
        svc.log_activity(
            Some("usr-2"),
            EntityType::GpsPoint,
            "gps-1",
            ActivityAction::Imported,
            Some(serde_json::json!({"rows": 3})),
        )
        .await
        .unwrap();

        let all = svc.query_activity(&ActivityFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entity_id, "gps-1", "newest first");

        let by_user = svc
            .query_activity(&ActivityFilter {
                user_id: Some("usr-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].entity_type, EntityType::Project);

        let imported = svc
            .query_activity(&ActivityFilter {
                action: Some(ActivityAction::Imported),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(imported[0].detail, Some(serde_json::json!({"rows": 3})));
    }

    #[tokio::test]
    async fn mutations_record_actor() {
        let svc = test_service().await;
        let project = create_test_project(&svc, "Wau road").await;

        let entries = svc
            .query_activity(&ActivityFilter {
                entity_id: Some(project.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ActivityAction::Created);
        assert_eq!(entries[0].user_id.as_deref(), Some("usr-tester01"));
    }

    #[tokio::test]
    async fn limit_is_applied() {
        let svc = test_service().await;
        for i in 0..5 {
            svc.log_activity(
                None,
                EntityType::Setting,
                &format!("key-{i}"),
                ActivityAction::Updated,
                None,
            )
            .await
            .unwrap();
        }
        let entries = svc
            .query_activity(&ActivityFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }
}

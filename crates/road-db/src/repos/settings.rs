//! System settings: a flat key-value table.

use chrono::Utc;

use road_core::entities::SystemSetting;
use road_core::entities::checks::non_empty;
use road_core::enums::{ActivityAction, EntityType};

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::RoadService;

fn row_to_setting(row: &libsql::Row) -> Result<SystemSetting, DatabaseError> {
    Ok(SystemSetting {
        key: row.get(0)?,
        value: row.get(1)?,
        updated_at: parse_datetime(&row.get::<String>(2)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_settings(&self) -> Result<Vec<SystemSetting>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT key, value, updated_at FROM system_settings ORDER BY key",
                (),
            )
            .await?;
        let mut settings = Vec::new();
        while let Some(row) = rows.next().await? {
            settings.push(row_to_setting(&row)?);
        }
        Ok(settings)
    }

    /// # Errors
    ///
    /// `NotFound` when the key is not set.
    pub async fn get_setting(&self, key: &str) -> Result<SystemSetting, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT key, value, updated_at FROM system_settings WHERE key = ?1",
                [key],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Setting, key))?;
        row_to_setting(&row)
    }

    /// Insert or overwrite a setting. Logged as `created` the first time a key
    /// is written and `updated` afterwards.
    ///
    /// # Errors
    ///
    /// Validation error for an empty key.
    pub async fn put_setting(
        &self,
        actor: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<SystemSetting, DatabaseError> {
        non_empty("key", key)?;
        let _gate = self.write_lock().await;
        let existed = match self.get_setting(key).await {
            Ok(_) => true,
            Err(err) if err.is_not_found() => false,
            Err(err) => return Err(err),
        };
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "INSERT INTO system_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                libsql::params![key, value, now.to_rfc3339()],
            )
            .await?;
        let action = if existed {
            ActivityAction::Updated
        } else {
            ActivityAction::Created
        };
        self.log_activity(
            actor,
            EntityType::Setting,
            key,
            action,
            Some(serde_json::json!({ "value": value })),
        )
        .await?;

        Ok(SystemSetting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when the key is not set.
    pub async fn delete_setting(&self, actor: Option<&str>, key: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM system_settings WHERE key = ?1", [key])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Setting, key));
        }
        self.log_activity(actor, EntityType::Setting, key, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::activity::ActivityFilter;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn seeded_settings_are_present() {
        let svc = test_service().await;
        let currency = svc.get_setting("default_currency").await.unwrap();
        assert_eq!(currency.value, "PGK");
        assert!(svc.list_settings().await.unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn put_creates_then_updates() {
        let svc = test_service().await;
        svc.put_setting(Some("usr-admin"), "report_day", "friday")
            .await
            .unwrap();
        let updated = svc
            .put_setting(Some("usr-admin"), "report_day", "monday")
            .await
            .unwrap();
        assert_eq!(updated.value, "monday");
        assert_eq!(svc.get_setting("report_day").await.unwrap().value, "monday");

        let log = svc
            .query_activity(&ActivityFilter {
                entity_id: Some("report_day".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let actions: Vec<ActivityAction> = log.iter().map(|a| a.action).collect();
        assert_eq!(actions, vec![ActivityAction::Updated, ActivityAction::Created]);
    }

    #[tokio::test]
    async fn missing_setting_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_setting("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }
}

//! Role-filtered navigation menu.

use chrono::Utc;

use road_core::entities::checks::non_empty;
use road_core::entities::{NavigationItem, NewNavigationItem};
use road_core::enums::{ActivityAction, EntityType, Role};
use road_core::errors::CoreError;
use road_core::ids::PREFIX_NAVIGATION;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, get_opt_string, parse_datetime, parse_enum};
use crate::service::RoadService;
use crate::updates::navigation::NavigationUpdate;

const SELECT_COLS: &str = "id, label, href, icon, sort_order, min_role, parent_id, created_at";

fn row_to_navigation(row: &libsql::Row) -> Result<NavigationItem, DatabaseError> {
    Ok(NavigationItem {
        id: row.get(0)?,
        label: row.get(1)?,
        href: row.get(2)?,
        icon: get_opt_string(row, 3)?,
        sort_order: row.get(4)?,
        min_role: parse_enum(&row.get::<String>(5)?)?,
        parent_id: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl RoadService {
    /// # Errors
    ///
    /// Validation errors, or a constraint error for an unknown parent.
    pub async fn create_navigation_item(
        &self,
        actor: Option<&str>,
        new: &NewNavigationItem,
    ) -> Result<NavigationItem, DatabaseError> {
        new.validate()?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_NAVIGATION).await?;
        let min_role = new.min_role.unwrap_or(Role::Viewer);

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO navigation_items ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                libsql::params![
                    id.as_str(),
                    new.label.trim(),
                    new.href.as_str(),
                    new.icon.as_deref(),
                    new.sort_order,
                    min_role.as_str(),
                    new.parent_id.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.log_activity(
            actor,
            EntityType::Navigation,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "href": new.href, "min_role": min_role })),
        )
        .await?;

        Ok(NavigationItem {
            id,
            label: new.label.trim().to_string(),
            href: new.href.clone(),
            icon: new.icon.clone(),
            sort_order: new.sort_order,
            min_role,
            parent_id: new.parent_id.clone(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no item has this id.
    pub async fn get_navigation_item(&self, id: &str) -> Result<NavigationItem, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM navigation_items WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Navigation, id))?;
        row_to_navigation(&row)
    }

    /// Menu items in display order. With a role, only the items that role
    /// may see are returned.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_navigation(
        &self,
        role: Option<Role>,
    ) -> Result<Vec<NavigationItem>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM navigation_items ORDER BY sort_order, label"
                ),
                (),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let item = row_to_navigation(&row)?;
            if role.is_none_or(|role| item.visible_to(role)) {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// # Errors
    ///
    /// `NotFound`, or validation errors.
    pub async fn update_navigation_item(
        &self,
        actor: Option<&str>,
        id: &str,
        update: NavigationUpdate,
    ) -> Result<NavigationItem, DatabaseError> {
        if let Some(ref label) = update.label {
            non_empty("label", label)?;
        }
        if let Some(ref href) = update.href {
            if !href.starts_with('/') {
                return Err(CoreError::validation(format!(
                    "href must start with '/' (got '{href}')"
                ))
                .into());
            }
        }
        if update.parent_id.as_ref().is_some_and(|p| p.as_deref() == Some(id)) {
            return Err(CoreError::validation("navigation item cannot be its own parent").into());
        }
        let _gate = self.write_lock().await;
        let current = self.get_navigation_item(id).await?;

        let mut set = UpdateSet::new();
        if let Some(ref label) = update.label {
            set.set("label", label.trim());
        }
        if let Some(ref href) = update.href {
            set.set("href", href.as_str());
        }
        if let Some(ref icon) = update.icon {
            set.set_nullable("icon", icon.clone());
        }
        if let Some(sort_order) = update.sort_order {
            set.set("sort_order", sort_order);
        }
        if let Some(min_role) = update.min_role {
            set.set("min_role", min_role.as_str());
        }
        if let Some(ref parent_id) = update.parent_id {
            set.set_nullable("parent_id", parent_id.clone());
        }
        if set.is_empty() {
            return Ok(current);
        }

        let (sql, params) = set.into_statement("navigation_items", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.log_activity(
            actor,
            EntityType::Navigation,
            id,
            ActivityAction::Updated,
            Some(serde_json::to_value(&update)?),
        )
        .await?;
        self.get_navigation_item(id).await
    }

    /// Delete an item; its children go with it.
    ///
    /// # Errors
    ///
    /// `NotFound` when no item has this id.
    pub async fn delete_navigation_item(
        &self,
        actor: Option<&str>,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM navigation_items WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::Navigation, id));
        }
        self.log_activity(actor, EntityType::Navigation, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

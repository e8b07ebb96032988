//! User repository. Password hashes are stored here but never leave the
//! crate except through [`RoadService::find_credentials`].

use chrono::Utc;

use road_core::entities::{User, NewUser, validate_email};
use road_core::entities::checks::non_empty;
use road_core::enums::{ActivityAction, EntityType};
use road_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSet, parse_datetime, parse_enum};
use crate::service::RoadService;
use crate::updates::user::UserUpdate;

const SELECT_COLS: &str = "id, email, name, role, created_at, updated_at";

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl RoadService {
    /// Create a user. `password_hash` is produced by the caller.
    ///
    /// # Errors
    ///
    /// Validation errors from [`NewUser::validate`], or a UNIQUE violation
    /// when the email is already registered.
    pub async fn create_user(
        &self,
        actor: Option<&str>,
        new: &NewUser,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        new.validate()?;
        let _gate = self.write_lock().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_USER).await?;
        let email = new.email.trim().to_lowercase();

        self.db()
            .conn()
            .execute(
                "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    email.as_str(),
                    new.name.trim(),
                    new.role.as_str(),
                    password_hash,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        self.log_activity(
            actor,
            EntityType::User,
            &id,
            ActivityAction::Created,
            Some(serde_json::json!({ "email": email, "role": new.role })),
        )
        .await?;

        Ok(User {
            id,
            email,
            name: new.name.trim().to_string(),
            role: new.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no user has this id.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::User, id))?;
        row_to_user(&row)
    }

    /// Look up a user and their password hash by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS}, password_hash FROM users WHERE email = ?1"),
                [email.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some((row_to_user(&row)?, row.get::<String>(6)?))),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM users ORDER BY email"), ())
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_users(&self) -> Result<u64, DatabaseError> {
        let mut rows = self.db().conn().query("SELECT COUNT(*) FROM users", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        crate::helpers::get_count(&row, 0)
    }

    /// # Errors
    ///
    /// `NotFound`, validation errors, or a UNIQUE violation on email.
    pub async fn update_user(
        &self,
        actor: Option<&str>,
        id: &str,
        update: UserUpdate,
    ) -> Result<User, DatabaseError> {
        if let Some(ref email) = update.email {
            validate_email(email)?;
        }
        if let Some(ref name) = update.name {
            non_empty("name", name)?;
        }
        let _gate = self.write_lock().await;
        self.get_user(id).await?;

        let mut set = UpdateSet::new();
        if let Some(ref email) = update.email {
            set.set("email", email.trim().to_lowercase());
        }
        if let Some(ref name) = update.name {
            set.set("name", name.trim());
        }
        if let Some(role) = update.role {
            set.set("role", role.as_str());
        }
        if let Some(ref hash) = update.password_hash {
            set.set("password_hash", hash.as_str());
        }
        if set.is_empty() {
            return self.get_user(id).await;
        }
        set.set("updated_at", Utc::now().to_rfc3339());

        let (sql, params) = set.into_statement("users", "id", id);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;

        let mut detail = serde_json::to_value(&update)?;
        if update.password_hash.is_some() {
            detail["password_changed"] = serde_json::Value::Bool(true);
        }
        self.log_activity(actor, EntityType::User, id, ActivityAction::Updated, Some(detail))
            .await?;
        self.get_user(id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no user has this id.
    pub async fn delete_user(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.write_lock().await;
        let affected = self
            .db()
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .await?;
        if affected == 0 {
            return Err(DatabaseError::not_found(EntityType::User, id));
        }
        self.log_activity(actor, EntityType::User, id, ActivityAction::Deleted, None)
            .await?;
        Ok(())
    }
}

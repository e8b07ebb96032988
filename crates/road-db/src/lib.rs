//! # road-db
//!
//! libSQL storage for Roadtrack.
//!
//! Holds all relational state: users, provinces, projects and their road
//! sections, contractors, GPS points and photos, construction activity,
//! milestones, funding, HSE incidents, progress reports, settings, navigation,
//! and the append-only activity log. CSV import/export of GPS points lives in
//! [`csv_io`].
//!
//! The database is a single local libSQL file (or `:memory:` in tests) and
//! every write goes through one [`service::RoadService`].

pub mod csv_io;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
mod test_support;
pub mod updates;

use error::DatabaseError;
use libsql::Builder;

/// A libSQL database and its one connection. An in-memory database is
/// private to its connection, so the service never opens a second one.
pub struct RoadDb {
    // Dropping the database closes the connection.
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl RoadDb {
    /// Open `path` (or `":memory:"`), enable foreign keys, and bring the
    /// schema up to date.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Migration` when the pragma or a migration fails, or the
    /// libSQL error when the file cannot be opened.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let opened = Self { db, conn };
        opened.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(opened)
    }

    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// New entity id: `prefix`, a dash, and eight lowercase hex digits drawn
    /// from `randomblob`.
    ///
    /// # Errors
    ///
    /// `DatabaseError::NoResult` if the query yields no row.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use road_core::ids::ALL_PREFIXES;
    use std::collections::HashSet;

    async fn test_db() -> RoadDb {
        RoadDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn opening_creates_every_table() {
        let db = test_db().await;

        let tables = [
            "users",
            "provinces",
            "projects",
            "road_sections",
            "contractors",
            "project_contractors",
            "gps_points",
            "gps_photos",
            "construction_activities",
            "milestones",
            "funding",
            "hse_incidents",
            "progress_reports",
            "system_settings",
            "navigation_items",
            "activity_log",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [*table],
                )
                .await
                .unwrap();
            assert!(
                rows.next().await.unwrap().is_some(),
                "table {table} should exist"
            );
        }
    }

    #[tokio::test]
    async fn ids_are_prefix_dash_eight_hex() {
        let db = test_db().await;
        let id = db.generate_id("prj").await.unwrap();
        assert!(id.starts_with("prj-"), "got {id}");
        assert_eq!(id.len(), 12);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn every_entity_prefix_yields_an_id() {
        let db = test_db().await;
        for prefix in ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn ids_do_not_repeat() {
        let db = test_db().await;
        let mut seen = HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(db.generate_id("gps").await.unwrap()));
        }
    }

    #[tokio::test]
    async fn migrations_rerun_without_reseeding() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();

        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM navigation_items", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 8);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO road_sections (id, project_id, name, start_chainage_km, end_chainage_km, created_at)
                 VALUES ('sec-1', 'prj-missing', 'Km 0-1', 0, 1, '2026-01-01T00:00:00+00:00')",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}

//! Service layer orchestrating database mutations with the activity log.
//!
//! `RoadService` wraps `RoadDb` (raw database access). All repo methods are
//! implemented as `impl RoadService` blocks in [`crate::repos`].

use tokio::sync::{Mutex, MutexGuard};

use road_config::DatabaseConfig;

use crate::RoadDb;
use crate::error::DatabaseError;

/// Orchestrates database mutations with the activity log.
///
/// Every mutation method follows this protocol:
/// 1. Validate the payload
/// 2. Take the write gate
/// 3. Execute SQL
/// 4. Append an activity entry naming the acting user
///
/// Multi-row writes (CSV import) additionally run inside a transaction. The
/// write gate keeps other mutations from interleaving with it on the shared
/// connection.
pub struct RoadService {
    db: RoadDb,
    write_gate: Mutex<()>,
}

impl RoadService {
    /// Create a new service over a local database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from_db(RoadDb::open_local(db_path).await?))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the configured database cannot be opened.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Self::new_local(&config.path).await
    }

    /// Create from an existing `RoadDb`.
    #[must_use]
    pub fn from_db(db: RoadDb) -> Self {
        Self {
            db,
            write_gate: Mutex::new(()),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &RoadDb {
        &self.db
    }

    /// Serialize a mutation against every other mutation.
    pub(crate) async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }
}

//! SQLite handle for the menu catalog.
//!
//! One connection behind a mutex serves every request; catalog reads are
//! short, so contention stays low. File databases run in WAL mode with a
//! busy timeout so a concurrent `seed` does not fail live lookups.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use cachama_core::error::CachamaError;

use crate::migrations;

/// How long a statement waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated catalog database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the catalog file at `path`, creating parent directories and
    /// applying pending migrations.
    pub fn new(path: &Path) -> Result<Self, CachamaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            CachamaError::Storage(format!("Cannot open catalog {}: {}", path.display(), e))
        })?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| CachamaError::Storage(format!("Cannot enable WAL: {}", e)))?;

        let db = Self::migrated(conn)?;
        info!(path = %path.display(), "Catalog database ready");
        Ok(db)
    }

    /// Fresh, migrated in-memory catalog.
    pub fn in_memory() -> Result<Self, CachamaError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CachamaError::Storage(format!("Cannot open in-memory catalog: {}", e)))?;
        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, CachamaError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| CachamaError::Storage(format!("Cannot set busy timeout: {}", e)))?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` while holding the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CachamaError>
    where
        F: FnOnce(&Connection) -> Result<T, CachamaError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CachamaError::Storage("Catalog connection poisoned".to_string()))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

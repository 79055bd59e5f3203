pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Owned handle to the tutor database.
///
/// Constructing a handle never touches storage. The connection is opened and
/// migrated on the first call to [`Database::connect`] or on the first query,
/// and reused for the life of the handle.
pub struct Database {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: Mutex::new(None),
        }
    }

    /// Private in-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: Mutex::new(None),
        }
    }

    /// Open the connection if it is not open yet. Calling this again is a no-op.
    pub fn connect(&self) -> Result<()> {
        let mut slot = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        if slot.is_none() {
            *slot = Some(self.establish()?);
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut slot = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        if slot.is_none() {
            *slot = Some(self.establish()?);
        }
        match slot.as_ref() {
            Some(conn) => f(conn),
            None => Err(anyhow::anyhow!("database connection unavailable")),
        }
    }

    fn establish(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => {
                let conn = Connection::open(path)?;
                // WAL mode for concurrent reads
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn
            }
            Location::Memory => Connection::open_in_memory()?,
        };
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        match &self.location {
            Location::File(path) => info!("Database opened at {}", path.display()),
            Location::Memory => info!("In-memory database opened"),
        }
        Ok(conn)
    }
}

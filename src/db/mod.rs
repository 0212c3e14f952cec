mod backend;
mod error;
mod photos;
mod records;
mod schema;

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, warn};

pub use backend::PhotoStore;
pub use error::{StoreError, StoreResult};
pub use records::{GeoPoint, NewPhoto, PhotoData, PhotoRecord};
pub use schema::{MIGRATIONS, SCHEMA};

/// Handle to the photo log database.
///
/// Created once at start-up and passed by reference to whatever needs it.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!(mode, "Journal mode set");
        info!("Database opened at {:?}", path);
        Ok(Self { conn })
    }

    /// A throwaway database living only as long as the handle.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations();
        Ok(())
    }

    fn run_migrations(&self) {
        for migration in MIGRATIONS {
            match self.conn.execute(migration, []) {
                Ok(_) => debug!(migration, "Migration applied"),
                Err(e) => warn!(migration, error = %e, "Migration skipped"),
            }
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

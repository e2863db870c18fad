mod queries;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use photo_grid_application::{ApplicationError, KeyValueStore};
use rusqlite::Connection;

use crate::migrations::MIGRATIONS;
use crate::storage::check_capacity;

/// Per-value limit of the durable tier.
pub const DURABLE_CAPACITY_BYTES: usize = 5 * 1024 * 1024;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Durable key-value store in a single SQLite file. Each call opens its own
/// connection, so separate processes sharing the file see last-write-wins.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    path: PathBuf,
    capacity: usize,
}

impl SqliteKeyValueStore {
    pub fn new(path: String, capacity: usize) -> Self {
        Self {
            path: PathBuf::from(path),
            capacity,
        }
    }

    pub fn initialize(&self) -> Result<(), ApplicationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "store path must not be empty".to_string(),
            ));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|error| ApplicationError::Io(error.to_string()))?;
            }
        }

        let conn = self.open_connection()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

        for migration in MIGRATIONS {
            conn.execute_batch(migration)
                .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        }

        Ok(())
    }

    fn open_connection(&self) -> Result<Connection, ApplicationError> {
        let conn = Connection::open(&self.path)
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        // Wait on a writer from another process instead of failing the read.
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        Ok(conn)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        let conn = self.open_connection()?;
        queries::get_value(&conn, key)
            .map_err(|error| ApplicationError::Persistence(error.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        check_capacity(key, value, self.capacity)?;
        let conn = self.open_connection()?;
        queries::upsert_value(&conn, key, value, &now_timestamp_string())
            .map_err(|error| ApplicationError::Persistence(error.to_string()))
    }
}

fn now_timestamp_string() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default();
    secs.to_string()
}

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use photo_grid_application::{ApplicationError, KeyValueStore};

use super::check_capacity;

/// Cookie-sized limit for a single session value.
pub const SESSION_CAPACITY_BYTES: usize = 4096;

/// Small per-session store: one file per key under a session directory.
#[derive(Debug, Clone)]
pub struct SessionFileStore {
    dir: PathBuf,
    capacity: usize,
}

impl SessionFileStore {
    pub fn new(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            capacity,
        }
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, ApplicationError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(ApplicationError::InvalidInput(format!(
                "session key must be alphanumeric, got {key:?}"
            )));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for SessionFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(ApplicationError::Io(format!(
                "failed to read {}: {error}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        let path = self.value_path(key)?;
        check_capacity(key, value, self.capacity)?;

        fs::create_dir_all(&self.dir).map_err(|error| ApplicationError::Io(error.to_string()))?;
        let staging = path.with_extension("tmp");
        fs::write(&staging, value).map_err(|error| ApplicationError::Io(error.to_string()))?;
        fs::rename(&staging, &path).map_err(|error| ApplicationError::Io(error.to_string()))
    }
}

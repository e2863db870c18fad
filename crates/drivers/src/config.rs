use std::path::PathBuf;

use photo_grid_adapters::{DURABLE_CAPACITY_BYTES, SESSION_CAPACITY_BYTES};

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store_path: String,
    pub session_dir: PathBuf,
    pub session_capacity: usize,
    pub durable_capacity: usize,
    pub ephemeral: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: "photo-grid.sqlite3".to_string(),
            session_dir: std::env::temp_dir().join("photo-grid-session"),
            session_capacity: SESSION_CAPACITY_BYTES,
            durable_capacity: DURABLE_CAPACITY_BYTES,
            ephemeral: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `PHOTO_GRID_*` variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(path) = lookup("PHOTO_GRID_STORE").filter(|value| !value.trim().is_empty()) {
            config.store_path = path;
        }
        if let Some(dir) = lookup("PHOTO_GRID_SESSION_DIR").filter(|value| !value.trim().is_empty())
        {
            config.session_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("PHOTO_GRID_SESSION_CAPACITY") {
            config.session_capacity = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid PHOTO_GRID_SESSION_CAPACITY: {raw}"))?;
        }
        if let Some(raw) = lookup("PHOTO_GRID_EPHEMERAL") {
            config.ephemeral = matches!(raw.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

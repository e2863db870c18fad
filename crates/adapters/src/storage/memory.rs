use std::cell::RefCell;
use std::collections::HashMap;

use photo_grid_application::{ApplicationError, KeyValueStore};

use super::check_capacity;

/// Process-lifetime store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RefCell<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
            capacity: Some(limit),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        if let Some(limit) = self.capacity {
            check_capacity(key, value, limit)?;
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

mod memory;
mod session;

pub use memory::MemoryKeyValueStore;
pub use session::{SessionFileStore, SESSION_CAPACITY_BYTES};

use photo_grid_application::ApplicationError;

pub(crate) fn check_capacity(key: &str, value: &str, limit: usize) -> Result<(), ApplicationError> {
    if value.len() > limit {
        return Err(ApplicationError::CapacityExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        });
    }
    Ok(())
}

use std::cell::RefCell;

use photo_grid_domain::{merge_saved, DataUri};
use tracing::{debug, warn};

use crate::KeyValueStore;

pub const ACTIVE_IMAGE_KEY: &str = "uploadedImage";
pub const SAVED_IMAGES_KEY: &str = "savedImages";

enum SavedRead {
    Absent,
    Parsed(Vec<DataUri>),
    Unparsable,
    Failed,
}

/// Two-tier image persistence: the active image lives in the small
/// session store, the saved list in the durable store.
///
/// Nothing here reports failure to the caller. Unreadable values load as
/// absent and rejected writes are logged and dropped.
pub struct ImageStore {
    session: Box<dyn KeyValueStore>,
    durable: Box<dyn KeyValueStore>,
    // Last saved list this store read or wrote; the base for appends when
    // the durable value cannot be read.
    known_saved: RefCell<Vec<DataUri>>,
}

impl ImageStore {
    pub fn new(session: Box<dyn KeyValueStore>, durable: Box<dyn KeyValueStore>) -> Self {
        Self {
            session,
            durable,
            known_saved: RefCell::new(Vec::new()),
        }
    }

    pub fn load_active(&self) -> Option<DataUri> {
        let raw = match self.session.get(ACTIVE_IMAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, key = ACTIVE_IMAGE_KEY, "failed to read active image");
                return None;
            }
        };

        match DataUri::parse(raw) {
            Ok(image) => Some(image),
            Err(error) => {
                warn!(%error, key = ACTIVE_IMAGE_KEY, "ignoring corrupt active image");
                None
            }
        }
    }

    pub fn set_active(&self, image: &DataUri) {
        match self.session.set(ACTIVE_IMAGE_KEY, image.as_str()) {
            Ok(()) => debug!(bytes = image.len(), "active image stored"),
            Err(error) => warn!(%error, key = ACTIVE_IMAGE_KEY, "active image not persisted"),
        }
    }

    pub fn load_saved(&self) -> Vec<DataUri> {
        match self.read_saved() {
            SavedRead::Parsed(saved) => {
                let mut known = self.known_saved.borrow_mut();
                *known = merge_saved(&known, saved.clone());
                saved
            }
            SavedRead::Absent | SavedRead::Unparsable | SavedRead::Failed => Vec::new(),
        }
    }

    /// Appends to the durable list and returns the list as it should now
    /// read. Concurrent writers race; the last write wins, but entries this
    /// store has already seen are written back rather than lost.
    ///
    /// When the durable list cannot be read at all, nothing is written.
    pub fn append_saved(&self, image: &DataUri) -> Vec<DataUri> {
        let read = match self.read_saved() {
            // One retry covers a transient failure such as a locked database.
            SavedRead::Failed => self.read_saved(),
            read => read,
        };

        let mut known = self.known_saved.borrow_mut();
        let write = !matches!(read, SavedRead::Failed);
        let mut saved = match read {
            SavedRead::Parsed(durable) => merge_saved(&known, durable),
            SavedRead::Absent | SavedRead::Unparsable | SavedRead::Failed => known.clone(),
        };
        saved.push(image.clone());
        *known = saved.clone();

        if !write {
            warn!(key = SAVED_IMAGES_KEY, "saved images unreadable, skipping write");
            return saved;
        }

        match serde_json::to_string(&saved) {
            Ok(json) => {
                if let Err(error) = self.durable.set(SAVED_IMAGES_KEY, &json) {
                    warn!(%error, key = SAVED_IMAGES_KEY, "saved images not persisted");
                } else {
                    debug!(count = saved.len(), "saved images stored");
                }
            }
            Err(error) => warn!(%error, "failed to serialize saved images"),
        }

        saved
    }

    fn read_saved(&self) -> SavedRead {
        let raw = match self.durable.get(SAVED_IMAGES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SavedRead::Absent,
            Err(error) => {
                warn!(%error, key = SAVED_IMAGES_KEY, "failed to read saved images");
                return SavedRead::Failed;
            }
        };

        let entries = match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, key = SAVED_IMAGES_KEY, "saved images list is unparsable");
                return SavedRead::Unparsable;
            }
        };

        SavedRead::Parsed(
            entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| match DataUri::parse(entry) {
                    Ok(image) => Some(image),
                    Err(error) => {
                        warn!(%error, index, "skipping corrupt saved image");
                        None
                    }
                })
                .collect(),
        )
    }
}

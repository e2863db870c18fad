use crate::DataUri;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

/// Everything the window shows, owned in one place and changed only
/// through [`ViewerState::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    pub active_image: Option<DataUri>,
    pub saved_images: Vec<DataUri>,
    pub show_saved_modal: bool,
    pub image_size: Option<ImageSize>,
    pub pending_read: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    Loaded {
        active: Option<DataUri>,
        saved: Vec<DataUri>,
    },
    ReadStarted {
        sequence: u64,
    },
    ImageRead {
        sequence: u64,
        image: DataUri,
    },
    ReadFailed {
        sequence: u64,
    },
    ImageMeasured {
        width: f32,
        height: f32,
    },
    SavedListUpdated {
        saved: Vec<DataUri>,
    },
    SelectSaved {
        index: usize,
    },
    ToggleSavedModal,
    CloseSavedModal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEffect {
    PersistActive(DataUri),
}

/// Combines a known saved list with a newer copy of it.
///
/// The result always starts with `known`, so a list never loses entries.
/// Entries of `incoming` past the part it shares with `known` are appended,
/// which keeps images added by another writer.
pub fn merge_saved(known: &[DataUri], incoming: Vec<DataUri>) -> Vec<DataUri> {
    let shared = known
        .iter()
        .zip(&incoming)
        .take_while(|(left, right)| left == right)
        .count();
    let mut merged = known.to_vec();
    merged.extend(incoming.into_iter().skip(shared));
    merged
}

impl ViewerState {
    pub fn apply(&mut self, action: ViewerAction) -> Vec<ViewerEffect> {
        match action {
            ViewerAction::Loaded { active, saved } => {
                self.set_active(active);
                self.saved_images = saved;
                Vec::new()
            }
            ViewerAction::ReadStarted { sequence } => {
                self.pending_read = Some(sequence);
                Vec::new()
            }
            ViewerAction::ImageRead { sequence, image } => {
                if !self.is_latest_read(sequence) {
                    return Vec::new();
                }
                self.pending_read = None;
                self.set_active(Some(image.clone()));
                vec![ViewerEffect::PersistActive(image)]
            }
            ViewerAction::ReadFailed { sequence } => {
                if self.is_latest_read(sequence) {
                    self.pending_read = None;
                }
                Vec::new()
            }
            ViewerAction::ImageMeasured { width, height } => {
                if self.active_image.is_some() {
                    self.image_size = Some(ImageSize { width, height });
                }
                Vec::new()
            }
            ViewerAction::SavedListUpdated { saved } => {
                self.saved_images = merge_saved(&self.saved_images, saved);
                Vec::new()
            }
            ViewerAction::SelectSaved { index } => {
                let Some(image) = self.saved_images.get(index).cloned() else {
                    return Vec::new();
                };
                self.set_active(Some(image.clone()));
                self.show_saved_modal = false;
                vec![ViewerEffect::PersistActive(image)]
            }
            ViewerAction::ToggleSavedModal => {
                self.show_saved_modal = !self.show_saved_modal;
                Vec::new()
            }
            ViewerAction::CloseSavedModal => {
                self.show_saved_modal = false;
                Vec::new()
            }
        }
    }

    fn set_active(&mut self, image: Option<DataUri>) {
        if self.active_image != image {
            self.image_size = None;
        }
        self.active_image = image;
    }

    fn is_latest_read(&self, sequence: u64) -> bool {
        self.pending_read == Some(sequence)
    }
}

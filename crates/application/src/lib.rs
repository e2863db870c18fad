mod error;
mod ports;
mod service;
mod store;
mod use_cases;

pub use error::ApplicationError;
pub use ports::{ImageReadPipeline, KeyValueStore, ReadOutcome, ReadRequest};
pub use service::ApplicationService;
pub use store::{ImageStore, ACTIVE_IMAGE_KEY, SAVED_IMAGES_KEY};
pub use use_cases::{
    BootstrapCommand, CloseSavedCommand, GridCellsQuery, MeasureImageCommand, PollUploadCommand,
    SaveActiveCommand, SelectSavedCommand, ToggleSavedCommand, UploadImageCommand,
};

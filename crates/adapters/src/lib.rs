pub mod codec;
pub mod migrations;
pub mod presenters;
pub mod reader;
pub mod sqlite;
pub mod storage;

pub use codec::{decode_data_uri, encode_image_bytes, encode_image_file};
pub use presenters::{present_active, present_cell_row, present_saved_row};
pub use reader::BackgroundImageReader;
pub use sqlite::{SqliteKeyValueStore, DURABLE_CAPACITY_BYTES};
pub use storage::{MemoryKeyValueStore, SessionFileStore, SESSION_CAPACITY_BYTES};

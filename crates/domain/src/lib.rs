mod error;
mod grid;
mod image;
mod viewer;

pub use error::DomainError;
pub use grid::{compute_cells, CellRect, GridSpec, GRID_COLS, GRID_ROWS};
pub use image::{DataUri, DecodedImage};
pub use viewer::{merge_saved, ImageSize, ViewerAction, ViewerEffect, ViewerState};

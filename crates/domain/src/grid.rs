use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const GRID_ROWS: u32 = 4;
pub const GRID_COLS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    rows: u32,
    cols: u32,
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32) -> Result<Self, DomainError> {
        if rows == 0 || cols == 0 {
            return Err(DomainError::EmptyGrid { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(self) -> u32 {
        self.rows
    }

    pub fn cols(self) -> u32 {
        self.cols
    }

    pub fn cell_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            cols: GRID_COLS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CellRect {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Half-open containment: a point on the shared edge of two cells
    /// belongs to the right/lower one.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Maps a cell computed in natural image pixels onto a displayed
    /// rectangle of another size.
    pub fn scaled(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            left: self.left * scale_x,
            top: self.top * scale_y,
            width: self.width * scale_x,
            height: self.height * scale_y,
        }
    }
}

/// Splits a `width` x `height` rectangle into `spec.rows() * spec.cols()`
/// equal cells in row-major order. Sizes are not rounded.
///
/// A zero width or height means the image has not been measured yet, and
/// every cell collapses to an empty rectangle at the origin.
pub fn compute_cells(width: f32, height: f32, spec: GridSpec) -> Result<Vec<CellRect>, DomainError> {
    if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
        return Err(DomainError::InvalidDimensions { width, height });
    }

    if width == 0.0 || height == 0.0 {
        return Ok(vec![CellRect::default(); spec.cell_count()]);
    }

    let cols = spec.cols() as usize;
    let cell_width = width / spec.cols() as f32;
    let cell_height = height / spec.rows() as f32;

    Ok((0..spec.cell_count())
        .map(|index| CellRect {
            left: (index % cols) as f32 * cell_width,
            top: (index / cols) as f32 * cell_height,
            width: cell_width,
            height: cell_height,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn default_spec_is_four_by_four() {
        let spec = GridSpec::default();
        assert_eq!(spec.rows(), 4);
        assert_eq!(spec.cols(), 4);
        assert_eq!(spec.cell_count(), 16);
    }

    #[test]
    fn spec_rejects_empty_grid() {
        assert!(matches!(
            GridSpec::new(0, 4),
            Err(DomainError::EmptyGrid { rows: 0, cols: 4 })
        ));
    }

    #[test]
    fn cells_for_landscape_image() {
        let cells = compute_cells(1000.0, 500.0, GridSpec::default()).expect("cells");
        assert_eq!(cells.len(), 16);
        for cell in &cells {
            assert_eq!(cell.width, 250.0);
            assert_eq!(cell.height, 125.0);
        }

        let row1_col2 = cells[4 + 2];
        assert_eq!(row1_col2.left, 500.0);
        assert_eq!(row1_col2.top, 125.0);
    }

    #[test]
    fn cells_tile_the_box_without_gaps() {
        for (width, height) in [(1000.0_f32, 500.0_f32), (333.0, 777.0), (1.0, 3.0), (640.5, 480.25)] {
            let cells = compute_cells(width, height, GridSpec::default()).expect("cells");
            assert_eq!(cells.len(), 16);

            let total: f32 = cells.iter().map(CellRect::area).sum();
            assert!((total - width * height).abs() <= width * height * EPSILON);

            for (index, cell) in cells.iter().enumerate() {
                let col = index % 4;
                let row = index / 4;
                if col < 3 {
                    assert!((cell.right() - cells[index + 1].left).abs() < EPSILON);
                } else {
                    assert!((cell.right() - width).abs() < EPSILON * width);
                }
                if row < 3 {
                    assert!((cell.bottom() - cells[index + 4].top).abs() < EPSILON);
                } else {
                    assert!((cell.bottom() - height).abs() < EPSILON * height);
                }
            }
        }
    }

    #[test]
    fn unmeasured_image_collapses_to_origin() {
        for (width, height) in [(0.0_f32, 0.0_f32), (0.0, 300.0), (300.0, 0.0)] {
            let cells = compute_cells(width, height, GridSpec::default()).expect("cells");
            assert_eq!(cells.len(), 16);
            assert!(cells.iter().all(|cell| *cell == CellRect::default()));
        }
    }

    #[test]
    fn rejects_negative_and_non_finite_dimensions() {
        assert!(compute_cells(-1.0, 10.0, GridSpec::default()).is_err());
        assert!(compute_cells(10.0, f32::NAN, GridSpec::default()).is_err());
        assert!(compute_cells(f32::INFINITY, 10.0, GridSpec::default()).is_err());
    }

    #[test]
    fn non_square_spec_is_row_major() {
        let spec = GridSpec::new(2, 3).expect("spec");
        let cells = compute_cells(300.0, 100.0, spec).expect("cells");
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[2].left, 200.0);
        assert_eq!(cells[2].top, 0.0);
        assert_eq!(cells[3].left, 0.0);
        assert_eq!(cells[3].top, 50.0);
    }

    #[test]
    fn scaled_cell_maps_to_display_space() {
        let cell = CellRect {
            left: 500.0,
            top: 125.0,
            width: 250.0,
            height: 125.0,
        };
        let shown = cell.scaled(0.5, 0.5);
        assert_eq!(shown.left, 250.0);
        assert_eq!(shown.height, 62.5);
        assert!(shown.contains(250.0, 62.5));
        assert!(!shown.contains(375.0, 62.5));
    }
}

//! Occupancy grid
//!
//! Row-major `width x height` matrix of cells. Row 0 is the top of the well,
//! row `height - 1` the floor.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::piece::{ShapeKind, Tetromino};

/// Read-only occupancy query shared by the engine and the dodge overlay
pub trait Occupancy {
    /// Whether the cell at `(x, y)` blocks movement.
    ///
    /// Cells left/right of the well and below the floor are solid.
    /// Cells above the top are always open.
    fn is_occupied(&self, x: i32, y: i32) -> bool;
}

/// The settled-block matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Option<ShapeKind>>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
        }
    }

    /// Build a grid from explicit rows (top row first). Used by tests and
    /// debugging tools.
    pub fn from_rows(rows: Vec<Vec<Option<ShapeKind>>>) -> Self {
        let height = rows.len().max(1) as i32;
        let width = rows.first().map(|r| r.len()).unwrap_or(1).max(1) as i32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.into_iter().enumerate() {
            for (x, cell) in row.into_iter().enumerate().take(width as usize) {
                grid.cells[y * width as usize + x] = cell;
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Cell contents, `None` for empty or out-of-bounds
    pub fn get(&self, x: i32, y: i32) -> Option<ShapeKind> {
        if self.in_bounds(x, y) {
            self.cells[self.index(x, y)]
        } else {
            None
        }
    }

    /// Set a single cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: Option<ShapeKind>) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    /// One row as a slice (top row is 0)
    pub fn row(&self, y: i32) -> &[Option<ShapeKind>] {
        let start = self.index(0, y.clamp(0, self.height - 1));
        &self.cells[start..start + self.width as usize]
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Option<ShapeKind>]> {
        self.cells.chunks(self.width as usize)
    }

    pub fn is_row_full(&self, y: i32) -> bool {
        self.row(y).iter().all(Option::is_some)
    }

    /// Number of occupied cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Write the piece's filled cells at its anchor.
    ///
    /// The caller must have checked collision first. Cells above row 0
    /// are dropped.
    pub fn merge(&mut self, piece: &Tetromino) {
        for cell in piece.cells() {
            self.set(cell.x, cell.y, Some(piece.kind));
        }
    }

    /// Remove every full row, shift the rest down, refill from the top.
    /// Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let width = self.width as usize;
        let kept: Vec<Option<ShapeKind>> = (0..self.height)
            .filter(|&y| !self.is_row_full(y))
            .flat_map(|y| self.row(y).iter().copied())
            .collect();

        let cleared = self.cells.len() - kept.len();
        if cleared == 0 {
            return 0;
        }

        let mut cells = vec![None; cleared];
        cells.extend(kept);
        self.cells = cells;
        (cleared / width) as u32
    }
}

impl Occupancy for Grid {
    fn is_occupied(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y >= self.height {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.cells[self.index(x, y)].is_some()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                let c = cell.map(ShapeKind::as_char).unwrap_or('.');
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

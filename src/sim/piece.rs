//! Tetromino shapes and the rotation transform

use glam::IVec2;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The seven canonical piece types. Doubles as the cell color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::J,
        ShapeKind::L,
    ];

    pub fn as_char(self) -> char {
        match self {
            ShapeKind::I => 'I',
            ShapeKind::O => 'O',
            ShapeKind::T => 'T',
            ShapeKind::S => 'S',
            ShapeKind::Z => 'Z',
            ShapeKind::J => 'J',
            ShapeKind::L => 'L',
        }
    }

    /// Spawn orientation of the canonical shape
    pub fn canonical_shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            ShapeKind::I => &[&[1, 1, 1, 1]],
            ShapeKind::O => &[&[1, 1], &[1, 1]],
            ShapeKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            ShapeKind::S => &[&[0, 1, 1], &[1, 1, 0]],
            ShapeKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
            ShapeKind::J => &[&[0, 0, 1], &[1, 1, 1]],
            ShapeKind::L => &[&[1, 0, 0], &[1, 1, 1]],
        };
        Shape {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }
}

/// Why a shape matrix was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape matrix has no rows or no filled cells")]
    Empty,
    #[error("shape matrix rows have different lengths")]
    Ragged,
}

/// Binary occupancy over a piece's bounding box.
///
/// Serialized as nested 0/1 integer arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    #[inline]
    pub fn width(&self) -> i32 {
        self.rows.first().map(|r| r.len()).unwrap_or(0) as i32
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    /// Offsets of filled cells relative to the top-left of the box
    pub fn filled(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| IVec2::new(x as i32, y as i32))
        })
    }

    /// Quarter turn clockwise: transpose of the row-reversed matrix
    pub fn rotated(&self) -> Shape {
        let h = self.rows.len();
        let w = self.width() as usize;
        let rows = (0..w)
            .map(|c| (0..h).map(|r| self.rows[h - 1 - r][c]).collect())
            .collect();
        Shape { rows }
    }
}

impl TryFrom<Vec<Vec<u8>>> for Shape {
    type Error = ShapeError;

    fn try_from(raw: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        let width = raw.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(ShapeError::Empty);
        }
        if raw.iter().any(|row| row.len() != width) {
            return Err(ShapeError::Ragged);
        }
        if raw.iter().flatten().all(|&c| c == 0) {
            return Err(ShapeError::Empty);
        }
        Ok(Shape {
            rows: raw
                .into_iter()
                .map(|row| row.into_iter().map(|c| c != 0).collect())
                .collect(),
        })
    }
}

impl From<Shape> for Vec<Vec<u8>> {
    fn from(shape: Shape) -> Self {
        shape
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(u8::from).collect())
            .collect()
    }
}

/// One entry of a shape table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub kind: ShapeKind,
    pub shape: Shape,
}

/// The set of shapes live play draws from. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeTable {
    defs: Vec<ShapeDef>,
}

impl Default for ShapeTable {
    fn default() -> Self {
        Self {
            defs: ShapeKind::ALL
                .iter()
                .map(|&kind| ShapeDef {
                    kind,
                    shape: kind.canonical_shape(),
                })
                .collect(),
        }
    }
}

impl ShapeTable {
    /// Build a table from explicit definitions; `None` if empty
    pub fn new(defs: Vec<ShapeDef>) -> Option<Self> {
        (!defs.is_empty()).then_some(Self { defs })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Uniform draw over the table
    pub fn draw(&self, rng: &mut dyn RngCore) -> &ShapeDef {
        &self.defs[rng.random_range(0..self.defs.len())]
    }
}

/// The falling piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tetromino {
    pub kind: ShapeKind,
    pub shape: Shape,
    /// Grid position of the bounding box's top-left cell
    pub pos: IVec2,
}

impl Tetromino {
    /// Place a new piece centered at the top of a grid `grid_width` wide
    pub fn spawn(kind: ShapeKind, shape: Shape, grid_width: i32) -> Self {
        let x = grid_width / 2 - shape.width() / 2;
        Self {
            kind,
            shape,
            pos: IVec2::new(x, 0),
        }
    }

    /// Absolute grid cells covered by the piece
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.shape.filled().map(move |offset| self.pos + offset)
    }

    /// Rotate in place. Returns the previous shape so the caller can
    /// restore it if the new placement collides.
    pub fn rotate(&mut self) -> Shape {
        let rotated = self.shape.rotated();
        std::mem::replace(&mut self.shape, rotated)
    }
}

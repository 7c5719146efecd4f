//! In-memory action log written by a recording engine

use serde::{Deserialize, Serialize};

use super::document::Input;
use crate::sim::{Shape, ShapeKind, Tetromino};

/// A piece drawn at spawn time, as stored in the piece sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub shape: Shape,
    pub key: ShapeKind,
}

impl PieceRecord {
    pub fn new(key: ShapeKind, shape: Shape) -> Self {
        Self { shape, key }
    }

    /// Build the piece at its spawn anchor
    pub fn spawn(&self, grid_width: i32) -> Tetromino {
        Tetromino::spawn(self.key, self.shape.clone(), grid_width)
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Spawn(PieceRecord),
    Move { dx: i32, dy: i32 },
    Rotate,
}

impl Action {
    /// Move and Rotate are player input; Spawn is not
    pub fn is_input(&self) -> bool {
        !matches!(self, Action::Spawn(_))
    }

    /// The replayable input, if this is one
    pub fn as_input(&self) -> Option<Input> {
        match *self {
            Action::Spawn(_) => None,
            Action::Move { dx, dy } => Some(Input::Move { dx, dy }),
            Action::Rotate => Some(Input::Rotate),
        }
    }
}

/// An action stamped with session-relative seconds.
///
/// The timestamp is informational; playback never paces itself by it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: f64,
    pub action: Action,
}

/// Ordered record of every spawn and accepted move
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    entries: Vec<LogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, action: Action) {
        self.entries.push(LogEntry { time, action });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pieces in spawn order
    pub fn piece_sequence(&self) -> impl Iterator<Item = &PieceRecord> {
        self.entries.iter().filter_map(|e| match &e.action {
            Action::Spawn(record) => Some(record),
            _ => None,
        })
    }

    /// Move/Rotate entries in order
    pub fn inputs(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.action.is_input())
    }
}

//! Persisted replay document
//!
//! JSON shape:
//! ```json
//! {
//!   "piece_sequence": [{"shape": [[1, 1, 1, 1]], "key": "I"}],
//!   "moves": [{"type": "move", "time": 0.4, "data": {"dx": -1, "dy": 0}},
//!             {"type": "rotate", "time": 0.9, "data": null}],
//!   "final_score": 100
//! }
//! ```
//! `time` is kept for reference only; playback never reads it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::actions::PieceRecord;
use crate::persistence::ReplayError;
use crate::sim::GameState;

/// A player input as replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Move { dx: i32, dy: i32 },
    Rotate,
}

/// One entry of the `moves` list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MoveWire", into = "MoveWire")]
pub struct RecordedInput {
    pub time: f64,
    pub input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MoveType {
    Move,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Delta {
    dx: i32,
    dy: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MoveWire {
    #[serde(rename = "type")]
    kind: MoveType,
    #[serde(default)]
    time: f64,
    #[serde(default)]
    data: Option<Delta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move entry has no dx/dy data")]
pub struct MissingDelta;

impl TryFrom<MoveWire> for RecordedInput {
    type Error = MissingDelta;

    fn try_from(wire: MoveWire) -> Result<Self, Self::Error> {
        let input = match wire.kind {
            MoveType::Move => {
                let Delta { dx, dy } = wire.data.ok_or(MissingDelta)?;
                Input::Move { dx, dy }
            }
            MoveType::Rotate => Input::Rotate,
        };
        Ok(RecordedInput {
            time: wire.time,
            input,
        })
    }
}

impl From<RecordedInput> for MoveWire {
    fn from(recorded: RecordedInput) -> Self {
        let (kind, data) = match recorded.input {
            Input::Move { dx, dy } => (MoveType::Move, Some(Delta { dx, dy })),
            Input::Rotate => (MoveType::Rotate, None),
        };
        MoveWire {
            kind,
            time: recorded.time,
            data,
        }
    }
}

/// Everything needed to re-drive a recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDocument {
    pub piece_sequence: Vec<PieceRecord>,
    pub moves: Vec<RecordedInput>,
    #[serde(default)]
    pub final_score: u64,
}

impl ReplayDocument {
    /// Capture a recording engine's log
    pub fn from_state(state: &GameState) -> Self {
        let log = state.log();
        Self {
            piece_sequence: log.piece_sequence().cloned().collect(),
            moves: log
                .entries()
                .iter()
                .filter_map(|entry| {
                    entry.action.as_input().map(|input| RecordedInput {
                        time: entry.time,
                        input,
                    })
                })
                .collect(),
            final_score: state.score(),
        }
    }

    /// Reject documents a replay cannot start from
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.piece_sequence.is_empty() {
            return Err(ReplayError::EmptyPieceSequence);
        }
        if self.moves.is_empty() {
            return Err(ReplayError::EmptyMoves);
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - No wall-clock reads; time only advances through explicit calls
//! - Injected RNG only (recording) or a recorded piece sequence (replay)
//! - No rendering or platform dependencies

pub mod grid;
pub mod piece;
pub mod state;
pub mod tick;

pub use grid::{Grid, Occupancy};
pub use piece::{Shape, ShapeDef, ShapeError, ShapeKind, ShapeTable, Tetromino};
pub use state::{EngineConfig, GameEvent, GamePhase, GameState, Mode, PieceFeed};
pub use tick::{Autoplay, TickInput, advance};

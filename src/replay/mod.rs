//! Recording and playback
//!
//! A recording engine fills an `ActionLog`; `ReplayDocument` is its
//! persisted form; `ReplayDriver` re-drives a document through a fresh
//! replaying engine.

pub mod actions;
pub mod document;
pub mod driver;

pub use actions::{Action, ActionLog, LogEntry, PieceRecord};
pub use document::{Input, MissingDelta, RecordedInput, ReplayDocument};
pub use driver::{DriverStatus, MovePolicy, ReplayDriver};

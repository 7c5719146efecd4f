//! Blockfall Replay - falling-block puzzle with deterministic action replay
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, pieces, collision, line clears)
//! - `replay`: Action log, persisted replay document, replay driver
//! - `minigame`: "Dodge the blocks" overlay that runs on top of a replay
//! - `persistence`: Save/load of replay documents
//! - `settings`: Tunables for the replay and dodge phases

pub mod minigame;
pub mod persistence;
pub mod replay;
pub mod settings;
pub mod sim;

pub use persistence::ReplayError;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Default grid dimensions (cells)
    pub const GRID_WIDTH: i32 = 10;
    pub const GRID_HEIGHT: i32 = 20;

    /// Points awarded per cleared row
    pub const SCORE_PER_LINE: u64 = 100;

    /// Gravity interval for live play (seconds between forced drops)
    pub const FALL_INTERVAL: f32 = 0.5;

    /// Fixed frame step used by the headless live loop (60 Hz)
    pub const LIVE_DT: f32 = 1.0 / 60.0;

    /// Replay/dodge phase tick (seconds per driver step)
    pub const REPLAY_DT: f32 = 1.0 / 10.0;

    /// Horizontal cells the dodge avatar covers per input
    pub const AVATAR_STRIDE: i32 = 5;

    /// Obstacle cadence for the dodge phase (in replay ticks)
    pub const OBSTACLE_SPAWN_INTERVAL: u32 = 12;
    pub const OBSTACLE_FALL_INTERVAL: u32 = 2;
}

//! Session settings
//!
//! Persisted as JSON next to the replay file. Missing keys take their
//! defaults so older settings files keep loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::replay::MovePolicy;

/// Tunables for recording, replay and the dodge phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for the live piece RNG and the overlay RNG
    pub seed: u64,
    /// Where the live session's replay is written and read back
    pub replay_path: String,

    // === Replay ===
    /// How recorded moves are applied on playback
    pub move_policy: MovePolicy,

    // === Dodge phase ===
    /// Row the avatar walks on (`None` = bottom row)
    pub avatar_row: Option<i32>,
    /// Columns covered per lateral input
    pub avatar_stride: i32,
    /// Spawn falling obstacles on top of the replay
    pub obstacles: bool,
    /// Replay ticks between obstacle spawns
    pub obstacle_spawn_interval: u32,
    /// Replay ticks between obstacle fall steps
    pub obstacle_fall_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            replay_path: "tetris_replay.json".to_string(),

            move_policy: MovePolicy::Slide,

            avatar_row: None,
            avatar_stride: AVATAR_STRIDE,
            obstacles: true,
            obstacle_spawn_interval: OBSTACLE_SPAWN_INTERVAL,
            obstacle_fall_interval: OBSTACLE_FALL_INTERVAL,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

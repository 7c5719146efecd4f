//! Replay driver
//!
//! Re-feeds a recorded document into a fresh replaying engine, one
//! recorded input per step followed by one gravity tick. The recorded
//! timestamps are never consulted; the caller chooses the step cadence.

use serde::{Deserialize, Serialize};

use super::document::{Input, RecordedInput, ReplayDocument};
use crate::persistence::ReplayError;
use crate::sim::{EngineConfig, GameEvent, GameState, Grid};

/// How a recorded `move` entry is applied during playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovePolicy {
    /// Keep stepping in the recorded direction until blocked
    #[default]
    Slide,
    /// Step exactly once, as during recording
    Nudge,
}

impl MovePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovePolicy::Slide => "slide",
            MovePolicy::Nudge => "nudge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slide" => Some(MovePolicy::Slide),
            "nudge" | "step" => Some(MovePolicy::Nudge),
            _ => None,
        }
    }
}

/// Where playback stands after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Running,
    /// Every recorded input has been applied. Normal completion.
    Exhausted,
    /// The replaying engine topped out
    GameOver,
}

pub struct ReplayDriver {
    state: GameState,
    moves: Vec<RecordedInput>,
    cursor: usize,
    policy: MovePolicy,
    steps: u64,
    recorded_score: u64,
}

impl ReplayDriver {
    /// Validate `doc` and build a replaying engine seeded with its pieces
    pub fn new(
        doc: &ReplayDocument,
        config: EngineConfig,
        policy: MovePolicy,
    ) -> Result<Self, ReplayError> {
        doc.validate()?;
        log::info!(
            "Starting replay: {} pieces, {} moves, move policy {}",
            doc.piece_sequence.len(),
            doc.moves.len(),
            policy.as_str()
        );
        Ok(Self {
            state: GameState::replay(config, doc.piece_sequence.clone()),
            moves: doc.moves.clone(),
            cursor: 0,
            policy,
            steps: 0,
            recorded_score: doc.final_score,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        self.state.grid()
    }

    pub fn policy(&self) -> MovePolicy {
        self.policy
    }

    /// Driver steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Recorded inputs not yet applied
    pub fn remaining(&self) -> usize {
        self.moves.len() - self.cursor
    }

    /// Score stored in the document, for comparison with the replay's
    pub fn recorded_score(&self) -> u64 {
        self.recorded_score
    }

    pub fn status(&self) -> DriverStatus {
        if self.state.is_game_over() {
            DriverStatus::GameOver
        } else if self.cursor >= self.moves.len() {
            DriverStatus::Exhausted
        } else {
            DriverStatus::Running
        }
    }

    /// Apply the next recorded input (if any), then one gravity tick
    pub fn step(&mut self) -> DriverStatus {
        let status = self.status();
        if status != DriverStatus::Running {
            return status;
        }

        let input = self.moves[self.cursor].input;
        self.cursor += 1;
        self.apply(input);
        self.state.tick();
        self.steps += 1;

        let status = self.status();
        match status {
            DriverStatus::Exhausted => log::info!(
                "Replay finished after {} steps, score {} (recorded {})",
                self.steps,
                self.state.score(),
                self.recorded_score
            ),
            DriverStatus::GameOver => log::info!("Replay topped out after {} steps", self.steps),
            DriverStatus::Running => {}
        }
        status
    }

    fn apply(&mut self, input: Input) {
        match input {
            Input::Rotate => {
                self.state.rotate_piece();
            }
            Input::Move { dx, dy } => match self.policy {
                MovePolicy::Nudge => {
                    self.state.move_piece(dx, dy);
                }
                MovePolicy::Slide => {
                    if dx == 0 && dy == 0 {
                        return;
                    }
                    // Upward slides never hit anything above the top
                    let limit = self.state.grid().width() + self.state.grid().height();
                    for _ in 0..limit {
                        if !self.state.move_piece(dx, dy) {
                            break;
                        }
                    }
                }
            },
        }
    }

    /// Step until exhausted or game over
    pub fn run(&mut self) -> DriverStatus {
        loop {
            let status = self.step();
            if status != DriverStatus::Running {
                return status;
            }
        }
    }

    /// Keep applying gravity until the piece in flight locks
    pub fn settle(&mut self) {
        let spawned = self.state.pieces_spawned();
        for _ in 0..=self.state.grid().height() + 1 {
            if self.state.is_game_over() || self.state.pieces_spawned() != spawned {
                break;
            }
            self.state.tick();
        }
    }

    /// Take the engine events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }
}

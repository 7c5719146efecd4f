//! Game state and the simulation engine
//!
//! `GameState` owns the grid and the falling piece and implements spawn,
//! move, rotate, and the gravity tick. A recording engine logs every
//! spawn and accepted player move; a replaying engine draws its pieces
//! from a recorded sequence instead of the RNG.

use std::fmt;

use glam::IVec2;
use rand::RngCore;

use super::grid::{Grid, Occupancy};
use super::piece::{ShapeKind, ShapeTable, Tetromino};
use crate::consts::*;
use crate::replay::{Action, ActionLog, PieceRecord};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Running,
    /// Terminal. Every mutating call is a no-op from here on.
    GameOver,
}

/// Where pieces come from, and whether input is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Record,
    Replay,
}

/// Fixed parameters of an engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub width: i32,
    pub height: i32,
    pub shapes: ShapeTable,
    pub score_per_line: u64,
    /// Seconds between gravity drops in live play
    pub fall_interval: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            shapes: ShapeTable::default(),
            score_per_line: SCORE_PER_LINE,
            fall_interval: FALL_INTERVAL,
        }
    }
}

/// Notifications for presentation layers (sound, effects, HUD)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    PieceSpawned(ShapeKind),
    PieceLocked(ShapeKind),
    LinesCleared { rows: u32, points: u64 },
    GameOver,
}

/// Piece source, one per mode
pub enum PieceFeed {
    Random(Box<dyn RngCore>),
    Sequence { pieces: Vec<PieceRecord>, next: usize },
}

impl PieceFeed {
    pub fn mode(&self) -> Mode {
        match self {
            PieceFeed::Random(_) => Mode::Record,
            PieceFeed::Sequence { .. } => Mode::Replay,
        }
    }
}

impl fmt::Debug for PieceFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceFeed::Random(_) => f.write_str("Random"),
            PieceFeed::Sequence { pieces, next } => f
                .debug_struct("Sequence")
                .field("len", &pieces.len())
                .field("next", next)
                .finish(),
        }
    }
}

/// Complete simulation state
#[derive(Debug)]
pub struct GameState {
    config: EngineConfig,
    grid: Grid,
    active: Option<Tetromino>,
    phase: GamePhase,
    score: u64,
    feed: PieceFeed,
    log: ActionLog,
    /// Session-relative seconds, used only to stamp log entries
    clock: f64,
    /// Accumulated frame time toward the next live gravity drop
    pub(crate) fall_timer: f32,
    lines_cleared: u32,
    pieces_spawned: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    fn with_feed(config: EngineConfig, feed: PieceFeed) -> Self {
        let mut state = Self {
            grid: Grid::new(config.width, config.height),
            config,
            active: None,
            phase: GamePhase::Running,
            score: 0,
            feed,
            log: ActionLog::new(),
            clock: 0.0,
            fall_timer: 0.0,
            lines_cleared: 0,
            pieces_spawned: 0,
            events: Vec::new(),
        };
        state.spawn_piece();
        state
    }

    /// Live engine drawing pieces uniformly from the shape table
    pub fn record(config: EngineConfig, rng: Box<dyn RngCore>) -> Self {
        log::info!(
            "Recording session on {}x{} grid",
            config.width,
            config.height
        );
        Self::with_feed(config, PieceFeed::Random(rng))
    }

    /// Replaying engine consuming `pieces` in order
    pub fn replay(config: EngineConfig, pieces: Vec<PieceRecord>) -> Self {
        log::info!("Replaying session with {} recorded pieces", pieces.len());
        Self::with_feed(config, PieceFeed::Sequence { pieces, next: 0 })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<&Tetromino> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn mode(&self) -> Mode {
        self.feed.mode()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn pieces_spawned(&self) -> u32 {
        self.pieces_spawned
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Advance the session clock. Only affects log timestamps.
    pub fn advance_clock(&mut self, dt: f64) {
        self.clock += dt;
    }

    /// Recorded pieces not yet spawned (always 0 when recording)
    pub fn pieces_remaining(&self) -> usize {
        match &self.feed {
            PieceFeed::Random(_) => 0,
            PieceFeed::Sequence { pieces, next } => pieces.len().saturating_sub(*next),
        }
    }

    /// Take pending presentation events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn log_action(&mut self, action: Action) {
        if self.mode() == Mode::Record {
            self.log.push(self.clock, action);
        }
    }

    fn enter_game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameOver);
        log::info!(
            "Game over: score {}, {} lines, {} pieces",
            self.score,
            self.lines_cleared,
            self.pieces_spawned
        );
    }

    /// Bring in the next piece. Ends the game if it overlaps the stack on
    /// arrival, or if a replay runs out of recorded pieces.
    pub fn spawn_piece(&mut self) {
        if self.is_game_over() {
            return;
        }

        let record = match &mut self.feed {
            PieceFeed::Random(rng) => {
                let def = self.config.shapes.draw(rng.as_mut());
                Some(PieceRecord::new(def.kind, def.shape.clone()))
            }
            PieceFeed::Sequence { pieces, next } => {
                let record = pieces.get(*next).cloned();
                if record.is_some() {
                    *next += 1;
                }
                record
            }
        };

        let Some(record) = record else {
            log::info!("Recorded piece sequence exhausted");
            self.active = None;
            self.enter_game_over();
            return;
        };

        let piece = record.spawn(self.config.width);
        self.log_action(Action::Spawn(record));
        self.pieces_spawned += 1;
        self.events.push(GameEvent::PieceSpawned(piece.kind));

        let blocked = self.collides(&piece, IVec2::ZERO);
        self.active = Some(piece);
        if blocked {
            self.enter_game_over();
        }
    }

    fn collides(&self, piece: &Tetromino, offset: IVec2) -> bool {
        piece.cells().any(|cell| {
            let p = cell + offset;
            self.grid.is_occupied(p.x, p.y)
        })
    }

    /// Would the active piece overlap walls, floor or stack if shifted by
    /// the offset? Cells above the top never collide.
    pub fn check_collision(&self, dx: i32, dy: i32) -> bool {
        match &self.active {
            Some(piece) => self.collides(piece, IVec2::new(dx, dy)),
            None => true,
        }
    }

    /// Shift the active piece without logging
    fn translate(&mut self, delta: IVec2) -> bool {
        if self.check_collision(delta.x, delta.y) {
            return false;
        }
        if let Some(piece) = &mut self.active {
            piece.pos += delta;
        }
        true
    }

    /// Move the active piece. Rejected moves change nothing and leave no
    /// log entry.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if self.is_game_over() {
            return false;
        }
        if dx == 0 && dy == 0 {
            return true;
        }
        if !self.translate(IVec2::new(dx, dy)) {
            return false;
        }
        self.log_action(Action::Move { dx, dy });
        true
    }

    /// Rotate the active piece a quarter turn. A rotation that would
    /// collide is reverted; there is no wall kick.
    pub fn rotate_piece(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        let Some(piece) = &mut self.active else {
            return false;
        };

        let previous = piece.rotate();
        if self.check_collision(0, 0) {
            if let Some(piece) = &mut self.active {
                piece.shape = previous;
            }
            return false;
        }

        self.log_action(Action::Rotate);
        true
    }

    /// Gravity: drop one row, or lock, clear and spawn when landed.
    /// The drop goes through `move_piece`, so it is logged when recording.
    pub fn tick(&mut self) {
        if self.is_game_over() {
            return;
        }
        if self.move_piece(0, 1) {
            return;
        }
        self.lock_piece();
    }

    fn lock_piece(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.grid.merge(&piece);
        self.events.push(GameEvent::PieceLocked(piece.kind));

        let rows = self.grid.clear_full_rows();
        if rows > 0 {
            let points = self.config.score_per_line * u64::from(rows);
            self.score += points;
            self.lines_cleared += rows;
            self.events.push(GameEvent::LinesCleared { rows, points });
            log::debug!("Cleared {} rows (+{}), score {}", rows, points, self.score);
        }

        self.spawn_piece();
    }

    /// Grid with the active piece drawn in
    pub fn composite(&self) -> Grid {
        let mut grid = self.grid.clone();
        if let Some(piece) = &self.active {
            grid.merge(piece);
        }
        grid
    }
}

/// Settled cells plus the falling piece
impl Occupancy for GameState {
    fn is_occupied(&self, x: i32, y: i32) -> bool {
        if self.grid.is_occupied(x, y) {
            return true;
        }
        self.active
            .as_ref()
            .is_some_and(|piece| piece.cells().any(|c| c == IVec2::new(x, y)))
    }
}

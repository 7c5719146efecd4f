//! "Dodge the blocks" phase
//!
//! A replay runs as the backdrop while the player steers an avatar along
//! one row. The avatar loses if it shares a cell with the replayed stack
//! or falling piece, or with one of the overlay's own falling obstacles.
//! The overlay keeps its own tick counter and RNG; it only reads the
//! backdrop through `Occupancy`.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::persistence::ReplayError;
use crate::replay::{DriverStatus, ReplayDocument, ReplayDriver};
use crate::settings::Settings;
use crate::sim::{EngineConfig, GameEvent, GameState, Occupancy};

/// Lateral intents for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvatarInput {
    pub left: bool,
    pub right: bool,
}

/// The player-controlled entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub pos: IVec2,
    /// Direction of the pending move, cleared once applied
    pub velocity: i32,
}

impl Avatar {
    pub fn steer(&mut self, input: AvatarInput) {
        match (input.left, input.right) {
            (true, false) => self.velocity = -1,
            (false, true) => self.velocity = 1,
            _ => {}
        }
    }

    /// Apply the pending impulse, staying within `[0, width)`
    pub fn apply(&mut self, stride: i32, width: i32) {
        self.pos.x = (self.pos.x + self.velocity * stride).clamp(0, width.max(1) - 1);
        self.velocity = 0;
    }
}

/// A falling block owned by the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obstacle {
    pub id: u32,
    pub pos: IVec2,
    /// Rows per fall step
    pub velocity: i32,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Stood in a cell the replayed game occupies
    Backdrop,
    Obstacle,
}

/// Avatar plus obstacles, advanced once per replay tick
#[derive(Debug, Clone)]
pub struct Overlay {
    pub avatar: Avatar,
    pub obstacles: Vec<Obstacle>,
    width: i32,
    height: i32,
    stride: i32,
    obstacles_enabled: bool,
    spawn_interval: u32,
    fall_interval: u32,
    ticks: u64,
    rng: Pcg32,
    next_id: u32,
}

impl Overlay {
    pub fn new(settings: &Settings, width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut rng = Pcg32::seed_from_u64(settings.seed ^ 0x0b57_ac1e);
        let row = settings
            .avatar_row
            .unwrap_or(height - 1)
            .clamp(0, height - 1);
        let avatar = Avatar {
            pos: IVec2::new(rng.random_range(0..width), row),
            velocity: 0,
        };
        Self {
            avatar,
            obstacles: Vec::new(),
            width,
            height,
            stride: settings.avatar_stride.max(1),
            obstacles_enabled: settings.obstacles,
            spawn_interval: settings.obstacle_spawn_interval.max(1),
            fall_interval: settings.obstacle_fall_interval.max(1),
            ticks: 0,
            rng,
            next_id: 1,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn steer(&mut self, input: AvatarInput) {
        self.avatar.steer(input);
    }

    fn hit_by_obstacle(&self) -> bool {
        self.obstacles.iter().any(|o| o.pos == self.avatar.pos)
    }

    /// Advance one tick against the current backdrop
    pub fn step(&mut self, backdrop: &impl Occupancy) -> Option<Collision> {
        self.ticks += 1;

        self.avatar.apply(self.stride, self.width);
        if backdrop.is_occupied(self.avatar.pos.x, self.avatar.pos.y) {
            return Some(Collision::Backdrop);
        }

        if !self.obstacles_enabled {
            return None;
        }

        if self.ticks % u64::from(self.fall_interval) == 0 {
            for obstacle in &mut self.obstacles {
                obstacle.pos.y += obstacle.velocity;
            }
            let height = self.height;
            self.obstacles.retain(|o| {
                let keep = o.pos.y < height;
                if !keep {
                    log::debug!("Obstacle {} left the grid", o.id);
                }
                keep
            });
        }

        if self.ticks % u64::from(self.spawn_interval) == 0 {
            let id = self.next_id;
            self.next_id += 1;
            let x = self.rng.random_range(0..self.width);
            log::debug!("Obstacle {} spawned at column {}", id, x);
            self.obstacles.push(Obstacle {
                id,
                pos: IVec2::new(x, 0),
                velocity: 1,
            });
        }

        self.hit_by_obstacle().then_some(Collision::Obstacle)
    }

    /// Rows of clear space above the avatar row in column `x`
    fn clearance(&self, backdrop: &impl Occupancy, x: i32) -> i32 {
        let row = self.avatar.pos.y;
        (0..=row)
            .find(|&d| {
                let y = row - d;
                backdrop.is_occupied(x, y)
                    || self.obstacles.iter().any(|o| o.pos == IVec2::new(x, y))
            })
            .unwrap_or(row + 1)
    }

    /// Demo steering: move to whichever reachable column has the most
    /// open space overhead
    pub fn autopilot(&self, backdrop: &impl Occupancy) -> AvatarInput {
        let x = self.avatar.pos.x;
        let left = (x - self.stride).max(0);
        let right = (x + self.stride).min(self.width - 1);

        let stay = self.clearance(backdrop, x);
        let go_left = self.clearance(backdrop, left);
        let go_right = self.clearance(backdrop, right);

        if go_left > stay && go_left >= go_right {
            AvatarInput {
                left: true,
                right: false,
            }
        } else if go_right > stay {
            AvatarInput {
                left: false,
                right: true,
            }
        } else {
            AvatarInput::default()
        }
    }
}

/// How a dodge run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The replay ran out of inputs with the avatar untouched
    Survived,
    /// Caught by the replayed stack or falling piece
    Crushed,
    /// Caught by an overlay obstacle
    Struck,
    /// The replayed game ended before its inputs did
    ToppedOut,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        *self == SessionOutcome::Survived
    }
}

/// Replay backdrop and overlay, stepped together
pub struct DodgeSession {
    driver: ReplayDriver,
    overlay: Overlay,
    outcome: Option<SessionOutcome>,
}

impl DodgeSession {
    pub fn new(
        doc: &ReplayDocument,
        config: EngineConfig,
        settings: &Settings,
    ) -> Result<Self, ReplayError> {
        let overlay = Overlay::new(settings, config.width, config.height);
        let driver = ReplayDriver::new(doc, config, settings.move_policy)?;
        log::info!(
            "Dodge phase: avatar at column {}, row {}, obstacles {}, move policy {}",
            overlay.avatar.pos.x,
            overlay.avatar.pos.y,
            if settings.obstacles { "on" } else { "off" },
            driver.policy().as_str()
        );
        Ok(Self {
            driver,
            overlay,
            outcome: None,
        })
    }

    pub fn driver(&self) -> &ReplayDriver {
        &self.driver
    }

    pub fn backdrop(&self) -> &GameState {
        self.driver.state()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// Backdrop events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.driver.drain_events()
    }

    /// Steering the overlay's demo pilot would choose right now
    pub fn autopilot(&self) -> AvatarInput {
        self.overlay.autopilot(self.driver.state())
    }

    /// One shared tick: replay step, then overlay step
    pub fn step(&mut self, input: AvatarInput) -> Option<SessionOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }

        self.overlay.steer(input);
        let status = self.driver.step();
        let hit = self.overlay.step(self.driver.state());

        let outcome = match (hit, status) {
            (Some(Collision::Backdrop), _) => Some(SessionOutcome::Crushed),
            (Some(Collision::Obstacle), _) => Some(SessionOutcome::Struck),
            (None, DriverStatus::GameOver) => Some(SessionOutcome::ToppedOut),
            (None, DriverStatus::Exhausted) => Some(SessionOutcome::Survived),
            (None, DriverStatus::Running) => None,
        };

        if let Some(outcome) = outcome {
            log::info!(
                "Dodge phase over after {} ticks: {:?}",
                self.overlay.ticks(),
                outcome
            );
        }
        self.outcome = outcome;
        outcome
    }

    /// Step with `pilot` choosing each tick's input until the run ends
    pub fn run_with(&mut self, mut pilot: impl FnMut(&Self) -> AvatarInput) -> SessionOutcome {
        loop {
            let input = pilot(self);
            if let Some(outcome) = self.step(input) {
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{Input, PieceRecord, RecordedInput};
    use crate::sim::{Grid, ShapeKind};

    fn settings(obstacles: bool) -> Settings {
        Settings {
            obstacles,
            ..Settings::default()
        }
    }

    fn doc(kinds: &[ShapeKind], inputs: &[Input]) -> ReplayDocument {
        ReplayDocument {
            piece_sequence: kinds
                .iter()
                .map(|&k| PieceRecord::new(k, k.canonical_shape()))
                .collect(),
            moves: inputs
                .iter()
                .map(|&input| RecordedInput { time: 0.0, input })
                .collect(),
            final_score: 0,
        }
    }

    fn overlay_at(x: i32, settings: &Settings) -> Overlay {
        let mut overlay = Overlay::new(settings, 10, 20);
        overlay.avatar.pos.x = x;
        overlay
    }

    #[test]
    fn test_avatar_impulse_is_single_tick() {
        let mut overlay = overlay_at(4, &settings(false));
        let grid = Grid::new(10, 20);

        overlay.steer(AvatarInput {
            left: false,
            right: true,
        });
        assert_eq!(overlay.step(&grid), None);
        assert_eq!(overlay.avatar.pos.x, 9);
        assert_eq!(overlay.avatar.velocity, 0);

        assert_eq!(overlay.step(&grid), None);
        assert_eq!(overlay.avatar.pos.x, 9);
    }

    #[test]
    fn test_avatar_clamped_to_grid() {
        let mut overlay = overlay_at(1, &settings(false));
        let grid = Grid::new(10, 20);
        overlay.steer(AvatarInput {
            left: true,
            right: false,
        });
        overlay.step(&grid);
        assert_eq!(overlay.avatar.pos.x, 0);
    }

    #[test]
    fn test_backdrop_collision() {
        let mut overlay = overlay_at(2, &settings(false));
        let mut grid = Grid::new(10, 20);
        grid.set(2, 19, Some(ShapeKind::S));
        assert_eq!(overlay.step(&grid), Some(Collision::Backdrop));
    }

    #[test]
    fn test_obstacles_spawn_fall_and_expire() {
        let s = Settings {
            obstacles: true,
            obstacle_spawn_interval: 3,
            obstacle_fall_interval: 2,
            avatar_row: Some(0),
            ..Settings::default()
        };
        let mut overlay = Overlay::new(&s, 10, 4);
        let grid = Grid::new(10, 4);

        overlay.step(&grid);
        overlay.step(&grid);
        assert!(overlay.obstacles.is_empty());
        overlay.step(&grid);
        assert_eq!(overlay.obstacles.len(), 1);
        assert_eq!(overlay.obstacles[0].pos.y, 0);

        overlay.step(&grid);
        assert_eq!(overlay.obstacles[0].pos.y, 1);

        // Falls off the bottom after row 3
        for _ in 0..6 {
            overlay.step(&grid);
        }
        assert!(overlay.obstacles.iter().all(|o| o.id != 1));
    }

    #[test]
    fn test_degenerate_dimensions_do_not_panic() {
        let s = settings(true);
        let mut overlay = Overlay::new(&s, 0, -3);
        assert_eq!(overlay.avatar.pos, IVec2::ZERO);

        overlay.steer(AvatarInput {
            left: false,
            right: true,
        });
        let grid = Grid::new(0, 0);
        for _ in 0..30 {
            overlay.step(&grid);
        }
        assert_eq!(overlay.avatar.pos.x, 0);

        let mut avatar = Avatar {
            pos: IVec2::new(3, 0),
            velocity: -1,
        };
        avatar.apply(5, 0);
        assert_eq!(avatar.pos.x, 0);
    }

    #[test]
    fn test_obstacle_hits_avatar() {
        let mut overlay = overlay_at(5, &settings(true));
        overlay.obstacles.push(Obstacle {
            id: 99,
            pos: IVec2::new(5, 19),
            velocity: 1,
        });
        let grid = Grid::new(10, 20);
        assert_eq!(overlay.step(&grid), Some(Collision::Obstacle));
    }

    #[test]
    fn test_survives_short_replay() {
        let doc = doc(
            &[ShapeKind::O, ShapeKind::O],
            &[Input::Rotate, Input::Rotate, Input::Rotate],
        );
        let mut s = settings(false);
        s.avatar_row = Some(19);
        let mut session = DodgeSession::new(&doc, EngineConfig::default(), &s).unwrap();
        session.overlay.avatar.pos.x = 0;

        let outcome = session.run_with(|_| AvatarInput::default());
        assert_eq!(outcome, SessionOutcome::Survived);
        assert!(outcome.is_success());
        assert_eq!(session.driver().steps(), 3);
    }

    #[test]
    fn test_crushed_by_replayed_piece() {
        // O slides to the floor above the avatar
        let doc = doc(
            &[ShapeKind::O, ShapeKind::O],
            &[Input::Move { dx: 0, dy: 1 }, Input::Rotate],
        );
        let mut session = DodgeSession::new(&doc, EngineConfig::default(), &settings(false)).unwrap();
        session.overlay.avatar.pos.x = 4;

        assert_eq!(
            session.step(AvatarInput::default()),
            Some(SessionOutcome::Crushed)
        );
        // Outcome is sticky
        assert_eq!(
            session.step(AvatarInput::default()),
            Some(SessionOutcome::Crushed)
        );
        assert_eq!(session.driver().steps(), 1);
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::PieceLocked(ShapeKind::O))
        );
    }

    #[test]
    fn test_topped_out_replay() {
        let doc = doc(&[ShapeKind::O], &[Input::Move { dx: 0, dy: 1 }; 3]);
        let mut session = DodgeSession::new(&doc, EngineConfig::default(), &settings(false)).unwrap();
        session.overlay.avatar.pos.x = 0;
        assert_eq!(
            session.run_with(|_| AvatarInput::default()),
            SessionOutcome::ToppedOut
        );
    }

    #[test]
    fn test_autopilot_moves_away_from_stack() {
        let s = settings(false);
        let mut overlay = overlay_at(0, &s);
        let mut grid = Grid::new(10, 20);
        for y in 10..19 {
            grid.set(0, y, Some(ShapeKind::I));
        }
        let input = overlay.autopilot(&grid);
        assert!(input.right);
        overlay.steer(input);
        assert_eq!(overlay.step(&grid), None);
        assert_eq!(overlay.avatar.pos.x, 5);
    }
}

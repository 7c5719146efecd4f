//! Live-play frame step
//!
//! Maps one frame of player intents onto engine calls and applies gravity
//! on a fixed interval of accumulated frame time.

use glam::IVec2;

use super::grid::{Grid, Occupancy};
use super::piece::{Shape, Tetromino};
use super::state::GameState;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Drop one row
    pub soft_drop: bool,
    /// Drop until landed
    pub hard_drop: bool,
    pub rotate: bool,
}

/// Advance a live session by one frame of `dt` seconds
pub fn advance(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.is_game_over() {
        return;
    }

    state.advance_clock(f64::from(dt));

    if input.rotate {
        state.rotate_piece();
    }
    if input.left {
        state.move_piece(-1, 0);
    }
    if input.right {
        state.move_piece(1, 0);
    }
    if input.soft_drop {
        state.move_piece(0, 1);
    }
    if input.hard_drop {
        while state.move_piece(0, 1) {}
    }

    state.fall_timer += dt;
    if state.fall_timer >= state.config().fall_interval {
        state.fall_timer = 0.0;
        state.tick();
    }
}

/// Chosen landing spot for one piece
#[derive(Debug, Clone)]
struct Plan {
    piece_number: u32,
    shape: Shape,
    x: i32,
}

/// Demo player: picks a placement per piece, then issues one intent per
/// frame to reach it.
#[derive(Debug, Clone, Default)]
pub struct Autoplay {
    plan: Option<Plan>,
}

impl Autoplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents for the next frame
    pub fn input(&mut self, state: &GameState) -> TickInput {
        let Some(piece) = state.active() else {
            return TickInput::default();
        };
        if state.is_game_over() {
            return TickInput::default();
        }

        let stale = self
            .plan
            .as_ref()
            .is_none_or(|p| p.piece_number != state.pieces_spawned());
        if stale {
            self.plan = best_placement(state.grid(), piece).map(|(shape, x)| Plan {
                piece_number: state.pieces_spawned(),
                shape,
                x,
            });
        }

        let Some(plan) = &self.plan else {
            return TickInput {
                hard_drop: true,
                ..Default::default()
            };
        };

        if piece.shape != plan.shape {
            TickInput {
                rotate: true,
                ..Default::default()
            }
        } else if piece.pos.x > plan.x {
            TickInput {
                left: true,
                ..Default::default()
            }
        } else if piece.pos.x < plan.x {
            TickInput {
                right: true,
                ..Default::default()
            }
        } else {
            TickInput {
                hard_drop: true,
                ..Default::default()
            }
        }
    }
}

/// Height of the stack in each column plus buried empty cells
fn surface_cost(grid: &Grid) -> i32 {
    let mut aggregate = 0;
    let mut holes = 0;
    for x in 0..grid.width() {
        let top = (0..grid.height()).find(|&y| grid.get(x, y).is_some());
        if let Some(top) = top {
            aggregate += grid.height() - top;
            holes += (top..grid.height())
                .filter(|&y| grid.get(x, y).is_none())
                .count() as i32;
        }
    }
    aggregate + 4 * holes
}

/// Best (orientation, column) for `piece` on `grid`, scored by cleared
/// rows against stack height and holes
fn best_placement(grid: &Grid, piece: &Tetromino) -> Option<(Shape, i32)> {
    let mut best: Option<(i32, Shape, i32)> = None;
    let mut shape = piece.shape.clone();

    for _ in 0..4 {
        for x in -3..grid.width() {
            let mut candidate = Tetromino {
                kind: piece.kind,
                shape: shape.clone(),
                pos: IVec2::new(x, piece.pos.y),
            };
            let fits = |t: &Tetromino| t.cells().all(|c| !grid.is_occupied(c.x, c.y));
            if !fits(&candidate) {
                continue;
            }
            while fits(&Tetromino {
                pos: candidate.pos + IVec2::Y,
                ..candidate.clone()
            }) {
                candidate.pos.y += 1;
            }

            let mut after = grid.clone();
            after.merge(&candidate);
            let cleared = after.clear_full_rows() as i32;
            let score = 20 * cleared - surface_cost(&after);

            if best.as_ref().is_none_or(|(s, _, _)| score > *s) {
                best = Some((score, shape.clone(), x));
            }
        }
        shape = shape.rotated();
    }

    best.map(|(_, shape, x)| (shape, x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LIVE_DT;
    use crate::replay::{Action, PieceRecord};
    use crate::sim::{EngineConfig, ShapeKind};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn replay_of(kinds: &[ShapeKind]) -> GameState {
        GameState::replay(
            EngineConfig::default(),
            kinds
                .iter()
                .map(|&k| PieceRecord::new(k, k.canonical_shape()))
                .collect(),
        )
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let mut state = replay_of(&[ShapeKind::T, ShapeKind::T]);
        let idle = TickInput::default();

        // 0.5s at 60 Hz is 30 frames
        for _ in 0..29 {
            advance(&mut state, &idle, LIVE_DT);
        }
        assert_eq!(state.active().map(|p| p.pos.y), Some(0));
        advance(&mut state, &idle, LIVE_DT);
        advance(&mut state, &idle, LIVE_DT);
        assert_eq!(state.active().map(|p| p.pos.y), Some(1));
    }

    #[test]
    fn test_hard_drop_logs_each_step() {
        let mut state = GameState::record(
            EngineConfig::default(),
            Box::new(Pcg32::seed_from_u64(5)),
        );
        let drop = TickInput {
            hard_drop: true,
            ..Default::default()
        };
        advance(&mut state, &drop, LIVE_DT);

        let steps = state
            .log()
            .inputs()
            .filter(|e| e.action == Action::Move { dx: 0, dy: 1 })
            .count();
        let height = state.active().map(|p| p.shape.height()).unwrap_or(0);
        assert_eq!(steps as i32, 20 - height);
    }

    #[test]
    fn test_no_input_after_game_over() {
        let mut state = replay_of(&[]);
        let clock = state.clock();
        advance(
            &mut state,
            &TickInput {
                left: true,
                ..Default::default()
            },
            LIVE_DT,
        );
        assert_eq!(state.clock(), clock);
    }

    #[test]
    fn test_autoplay_clears_lines() {
        let mut state = GameState::record(
            EngineConfig::default(),
            Box::new(Pcg32::seed_from_u64(42)),
        );
        let mut bot = Autoplay::new();
        for _ in 0..20_000 {
            if state.is_game_over() || state.lines_cleared() >= 4 {
                break;
            }
            let input = bot.input(&state);
            advance(&mut state, &input, LIVE_DT);
        }
        assert!(state.lines_cleared() >= 4);
        assert!(state.log().inputs().count() > 0);
    }

    #[test]
    fn test_best_placement_fills_gap() {
        let mut grid = Grid::new(4, 4);
        for x in 0..3 {
            grid.set(x, 3, Some(ShapeKind::O));
        }
        let piece = Tetromino::spawn(ShapeKind::I, ShapeKind::I.canonical_shape(), 4);
        let (shape, x) = best_placement(&grid, &piece).unwrap();
        assert_eq!(shape, ShapeKind::I.canonical_shape().rotated());
        assert_eq!(x, 3);
    }
}

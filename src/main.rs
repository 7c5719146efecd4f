//! Blockfall Replay entry point
//!
//! Headless run of both phases: an autoplay bot records a live session,
//! the replay is saved and read back, then the dodge phase plays over it
//! with the avatar autopilot at the wheel.
//!
//! Usage: `blockfall-replay [settings.json]`

use std::process::ExitCode;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use blockfall_replay::consts::*;
use blockfall_replay::minigame::{DodgeSession, SessionOutcome};
use blockfall_replay::persistence::{load_replay, save_replay};
use blockfall_replay::replay::ReplayDocument;
use blockfall_replay::sim::{Autoplay, EngineConfig, GameEvent, GameState, advance};
use blockfall_replay::{ReplayError, Settings};

/// Cap on live frames (10 minutes at 60 Hz)
const MAX_LIVE_FRAMES: u32 = 60 * 60 * 10;

/// Part 1: live play, recorded
fn record_session(settings: &Settings) -> GameState {
    let rng = Box::new(Pcg32::seed_from_u64(settings.seed));
    let mut state = GameState::record(EngineConfig::default(), rng);
    let mut bot = Autoplay::new();
    let mut frames = 0;
    let mut tetrises = 0;

    while !state.is_game_over() && frames < MAX_LIVE_FRAMES {
        let input = bot.input(&state);
        advance(&mut state, &input, LIVE_DT);
        frames += 1;

        for event in state.drain_events() {
            if let GameEvent::LinesCleared { rows: 4, .. } = event {
                tetrises += 1;
            }
        }
    }

    if !state.is_game_over() {
        log::info!("Live session stopped after {} frames", frames);
    }
    log::info!(
        "Part 1 done: score {}, {} lines ({} four-row clears), {} pieces, {:.1}s",
        state.score(),
        state.lines_cleared(),
        tetrises,
        state.pieces_spawned(),
        state.clock()
    );
    state
}

/// Part 2: dodge the blocks over the replay
fn dodge(doc: &ReplayDocument, settings: &Settings) -> Result<SessionOutcome, ReplayError> {
    log::info!("PART 2: DODGE THE BLOCKS!");
    let mut session = DodgeSession::new(doc, EngineConfig::default(), settings)?;
    let outcome = session.run_with(DodgeSession::autopilot);
    let locked = session
        .drain_events()
        .iter()
        .filter(|e| matches!(e, GameEvent::PieceLocked(_)))
        .count();
    log::info!("Backdrop locked {} pieces", locked);

    let backdrop = session.backdrop();
    log::info!(
        "Replay ran {} steps ({:.1}s at replay speed), score {} vs recorded {}",
        session.driver().steps(),
        session.driver().steps() as f32 * REPLAY_DT,
        backdrop.score(),
        session.driver().recorded_score()
    );
    log::debug!("Final backdrop:\n{}", backdrop.composite());
    Ok(outcome)
}

fn run(settings: &Settings) -> Result<SessionOutcome, ReplayError> {
    let state = record_session(settings);
    save_replay(&settings.replay_path, &ReplayDocument::from_state(&state))?;

    let doc = load_replay(&settings.replay_path)?;
    dodge(&doc, settings)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Blockfall Replay starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    log::info!("Seed: {}", settings.seed);

    match run(&settings) {
        Ok(outcome) if outcome.is_success() => {
            log::info!("You dodged every block!");
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            log::info!("Dodge phase lost: {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

//! Reflex Rush demo entry point
//!
//! Runs a scripted autoplay session through the public API: a bot reads each
//! instruction, plays it (mostly) correctly, and the run is logged until game
//! over. Useful for eyeballing level flow and difficulty pacing without a UI.

use std::time::{SystemTime, UNIX_EPOCH};

use reflex_rush::game::rules::{Action, RuleId, RuleParams};
use reflex_rush::game::state::CorrectPlay;
use reflex_rush::{GameSession, GameStatus, InMemoryStore};

/// Play the live level the way its rule wants (the demo-mode bot).
fn play_level(session: &mut GameSession<InMemoryStore>, sabotage: bool) {
    let Some(level) = session.level().cloned() else {
        return;
    };
    let memory = session.state().memory.clone();

    if sabotage {
        // Deliberately flub the level to show the fail/continue path
        for _ in 0..7 {
            session.handle_tap();
        }
        run_clock(session);
        return;
    }

    match (level.rule, level.params) {
        (RuleId::TapOnce, _) => session.handle_tap(),
        (RuleId::DoubleTap, _) => {
            session.handle_tap();
            session.handle_tap();
        }
        (RuleId::TapNTimes, RuleParams::TapNTimes { count }) => {
            for _ in 0..count {
                session.handle_tap();
            }
        }
        (RuleId::DontTap, _) | (RuleId::RememberNumber, _) | (RuleId::RememberIcon, _) => {}
        (RuleId::Opposite, RuleParams::Opposite { count }) => {
            if count == 0 {
                session.handle_tap();
            }
        }
        (RuleId::RecallNumber, _) => {
            for _ in 0..memory.number.unwrap_or(0) {
                session.handle_tap();
            }
        }
        (RuleId::RecallIcon, RuleParams::RecallIcon { target_icon }) => {
            if memory.icon == Some(target_icon) {
                session.handle_tap();
            }
        }
        (RuleId::MathTap, RuleParams::MathTap { answer, .. }) => {
            for _ in 0..answer {
                session.handle_tap();
            }
        }
        (RuleId::RepeatPrevious, _) => {
            if memory.previous_correct_action != Some(CorrectPlay::Wait) {
                session.handle_tap();
            }
        }
        (RuleId::Stroop, RuleParams::Stroop { should_tap, .. }) => {
            if should_tap {
                session.handle_tap();
            }
        }
        (RuleId::FakeCrash, _) => session.handle_tap(),
        (RuleId::Hold, RuleParams::Hold { min_ms }) => {
            session.handle_action(Action::HoldStart);
            session.handle_action(Action::HoldEnd {
                held_ms: min_ms + 200,
            });
        }
        (RuleId::Rotate, _) => session.handle_action(Action::Rotate),
        (RuleId::MultiTouch, RuleParams::MultiTouch { fingers }) => {
            session.handle_action(Action::MultiTouch { touches: fingers });
        }
        (rule, _) => log::warn!("bot has no play for {:?}, waiting it out", rule),
    }
    run_clock(session);
}

/// Tick until the live level resolves.
fn run_clock(session: &mut GameSession<InMemoryStore>) {
    while session.state().status == GameStatus::Playing {
        session.tick();
    }
}

/// Tick through the post-completion transition into the next level.
fn run_transition(session: &mut GameSession<InMemoryStore>) {
    while session.state().status == GameStatus::LevelComplete {
        session.tick();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    log::info!("autoplay session, seed {seed}");

    let mut session = GameSession::with_seed(seed);
    session.start_game();

    let mut played = 0u32;
    while played < 40 {
        let Some(level) = session.level() else { break };
        println!(
            "level {:>2} [{:?}] \"{}\" ({} ms)",
            level.id, level.rule, level.instruction, level.time_limit_ms
        );

        // Flub every sixth level to exercise lives and rescue time
        let sabotage = played % 6 == 5;
        play_level(&mut session, sabotage);
        played += 1;

        match session.state().status {
            GameStatus::LevelComplete => {
                println!(
                    "  passed: score {} (combo {})",
                    session.state().score,
                    session.state().combo
                );
                run_transition(&mut session);
            }
            GameStatus::Failed => {
                println!("  failed: {} lives left", session.state().lives);
                session.continue_game();
            }
            GameStatus::GameOver => {
                println!(
                    "game over at level {}: final score {}, high score {}",
                    session.state().current_level,
                    session.state().score,
                    session.high_score()
                );
                break;
            }
            status => {
                log::warn!("unexpected status {:?}", status);
                break;
            }
        }
    }

    if session.state().status != GameStatus::GameOver {
        println!(
            "run stopped after {} levels: score {}, {} lives left",
            played,
            session.state().score,
            session.state().lives
        );
    }
}

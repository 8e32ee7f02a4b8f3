//! Game loop / session state machine
//!
//! Owns the `GameState`, the live `Level`, the countdown, and the
//! between-level transitions. Everything funnels through `&mut self`, so a
//! session is a single-writer path: actions and timer ticks can never race
//! against the same state snapshot.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::devtools;
use super::difficulty::PerfContext;
use super::levels::{self, Category, Level, ScreenKind};
use super::rules::{Action, MemoryUpdate, RuleParams, ValidationResult, validate};
use super::scoring::{calculate_combo, calculate_score};
use super::stages;
use super::state::{GameState, GameStatus, Memory, SessionHistory};
use crate::consts::{
    CHAPTER_SCREEN_QUOTA, HARDCORE_LIVES, START_LIVES, TICK_MS, TRANSITION_DELAY_MS,
};
use crate::progress::{ChapterRecord, InMemoryStore, Progress, ProgressStore};

/// How the session picks its next level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Guided campaign: scripted stages, then random
    Classic,
    /// Bounded run of levels with its own completion record
    Chapter { id: u32 },
    /// Random levels only, normal lives
    Endless,
    /// Random levels, one life
    Hardcore,
    /// QA bypass: levels drawn from one category/screen pair
    Test {
        category: Category,
        screen: Option<ScreenKind>,
    },
}

/// A full game session. Single-threaded and timer-driven: the embedding
/// platform calls `tick()` every `TICK_MS` and forwards player input through
/// `handle_action`.
pub struct GameSession<S: ProgressStore> {
    seed: u64,
    rng: Pcg32,
    mode: GameMode,
    state: GameState,
    level: Option<Level>,
    history: SessionHistory,
    /// Countdown is live (exactly one timer exists at a time)
    timer_running: bool,
    /// Time until the next level auto-starts after a completion
    pending_next_ms: Option<u32>,
    progress: Progress,
    store: S,
}

impl GameSession<InMemoryStore> {
    /// Session with a volatile store and the given run seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_store(seed, InMemoryStore::new())
    }
}

impl<S: ProgressStore> GameSession<S> {
    /// Session backed by a platform progress store.
    pub fn with_store(seed: u64, store: S) -> Self {
        let progress = store.load();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            mode: GameMode::Classic,
            state: GameState::new(START_LIVES),
            level: None,
            history: SessionHistory::default(),
            timer_running: false,
            pending_next_ms: None,
            progress,
            store,
        }
    }

    // --- session initializers -------------------------------------------

    /// Start the guided campaign.
    pub fn start_game(&mut self) {
        self.begin_run(GameMode::Classic, START_LIVES);
    }

    /// Start a bounded chapter run.
    pub fn start_chapter(&mut self, id: u32) {
        self.begin_run(GameMode::Chapter { id }, START_LIVES);
    }

    /// Start an endless random run.
    pub fn start_endless(&mut self) {
        self.begin_run(GameMode::Endless, START_LIVES);
    }

    /// Start a one-life run.
    pub fn start_hardcore(&mut self) {
        self.begin_run(GameMode::Hardcore, HARDCORE_LIVES);
    }

    /// QA entry point: random levels from one category, no gating.
    pub fn start_test_category(&mut self, category: Category) {
        self.begin_run(
            GameMode::Test {
                category,
                screen: None,
            },
            START_LIVES,
        );
    }

    /// QA entry point narrowed to a single screen type.
    pub fn start_test_screen(&mut self, category: Category, screen: ScreenKind) {
        self.begin_run(
            GameMode::Test {
                category,
                screen: Some(screen),
            },
            START_LIVES,
        );
    }

    fn begin_run(&mut self, mode: GameMode, lives: u8) {
        log::info!("starting run: {:?} (seed {})", mode, self.seed);
        self.cancel_timers();
        self.mode = mode;
        self.state = GameState::new(lives);
        self.history = SessionHistory::default();
        self.state.current_level = 1;
        self.start_level();
    }

    // --- level lifecycle ------------------------------------------------

    fn perf(&self) -> PerfContext {
        PerfContext {
            combo: self.state.combo,
            recent_errors: self.history.recent_errors(),
            chapter: match self.mode {
                GameMode::Chapter { id } => Some(id),
                _ => None,
            },
        }
    }

    fn next_level(&mut self) -> Level {
        let n = self.state.current_level;
        let perf = self.perf();
        match self.mode {
            GameMode::Classic => stages::stage_level(n, &perf).unwrap_or_else(|| {
                levels::generate_level(&mut self.rng, n, &self.history, &self.state.memory, &perf)
            }),
            GameMode::Chapter { .. } | GameMode::Endless | GameMode::Hardcore => {
                levels::generate_level(&mut self.rng, n, &self.history, &self.state.memory, &perf)
            }
            GameMode::Test { category, screen } => {
                devtools::test_level(&mut self.rng, category, screen).unwrap_or_else(|| {
                    levels::generate_level(
                        &mut self.rng,
                        n,
                        &self.history,
                        &self.state.memory,
                        &perf,
                    )
                })
            }
        }
    }

    fn start_level(&mut self) {
        self.cancel_timers();
        let level = self.next_level();
        log::debug!(
            "level {}: {:?} \"{}\" ({} ms)",
            level.id,
            level.rule,
            level.instruction,
            level.time_limit_ms
        );

        // Fold values this level asks the player to remember into a fresh
        // memory snapshot before play begins.
        self.state.memory = match level.params {
            RuleParams::RememberNumber { number } => self.state.memory.remembering_number(number),
            RuleParams::RememberIcon { icon } => self.state.memory.remembering_icon(icon),
            _ => self.state.memory.clone(),
        };

        self.history.record_generated(level.rule, level.category);
        self.state.tap_count = 0;
        self.state.time_remaining_ms = level.time_limit_ms as i32;
        self.state.status = GameStatus::Playing;
        self.level = Some(level);
        self.timer_running = true;
    }

    fn cancel_timers(&mut self) {
        self.timer_running = false;
        self.pending_next_ms = None;
    }

    /// Advance the session clock by one tick interval.
    ///
    /// Drives both the level countdown and the post-completion transition
    /// delay. Best-effort: `time_remaining` reaches zero within one tick of
    /// the nominal deadline, never mid-tick.
    pub fn tick(&mut self) {
        if let Some(ms) = self.pending_next_ms {
            let remaining = ms.saturating_sub(TICK_MS);
            if remaining == 0 {
                self.pending_next_ms = None;
                self.state.current_level += 1;
                self.start_level();
            } else {
                self.pending_next_ms = Some(remaining);
            }
            return;
        }

        if self.state.status == GameStatus::Playing && self.timer_running {
            self.state.time_remaining_ms -= TICK_MS as i32;
            if self.state.time_remaining_ms <= 0 {
                self.state.time_remaining_ms = self.state.time_remaining_ms.max(0);
                self.timer_running = false;
                self.resolve(Action::TimerExpired);
            }
        }
    }

    // --- player input ---------------------------------------------------

    /// Sole player-input entry point.
    pub fn handle_action(&mut self, action: Action) {
        if self.state.status != GameStatus::Playing {
            return;
        }
        // Expiry is synthesized by the tick loop; an outside caller must not
        // be able to resolve a level early with it.
        if action == Action::TimerExpired {
            return;
        }
        // Count the tap first so validation observes the post-action count
        if action == Action::Tap {
            self.state.tap_count += 1;
        }
        self.state.memory = self.state.memory.with_action(action);
        self.resolve(action);
    }

    /// Convenience wrapper for the common case.
    pub fn handle_tap(&mut self) {
        self.handle_action(Action::Tap);
    }

    fn resolve(&mut self, action: Action) {
        let Some(level) = &self.level else {
            return;
        };
        let result = validate(level, &self.state, action);
        if result.passed {
            self.complete_level(&result);
        } else if result.reason.is_some() {
            self.fail_level(&result);
        }
        // No reason: mid-sequence, keep waiting
    }

    fn complete_level(&mut self, result: &ValidationResult) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        self.timer_running = false;

        self.state.combo = calculate_combo(self.state.combo, true);
        let earned = calculate_score(
            self.state.combo,
            self.state.time_remaining_ms.max(0) as u32,
            level.time_limit_ms,
        );
        self.state.score += earned;

        let mut memory = self
            .state
            .memory
            .after_complete(level.rule, self.state.tap_count);
        if let Some(update) = result.memory_update {
            memory = apply_memory_update(&memory, update);
        }
        self.state.memory = memory;
        self.history.record_result(true);

        log::debug!(
            "level {} complete: +{} (combo {}, score {})",
            level.id,
            earned,
            self.state.combo,
            self.state.score
        );

        if let GameMode::Chapter { id } = self.mode {
            self.history.chapter_screens += 1;
            if self.history.chapter_screens >= CHAPTER_SCREEN_QUOTA {
                self.state.status = GameStatus::ChapterComplete;
                self.persist_chapter(id);
                return;
            }
        }

        self.state.status = GameStatus::LevelComplete;
        self.pending_next_ms = Some(TRANSITION_DELAY_MS);
    }

    fn fail_level(&mut self, result: &ValidationResult) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        self.timer_running = false;

        self.state.combo = calculate_combo(self.state.combo, false);
        self.state.memory = self.state.memory.after_fail(level.rule);
        self.history.record_result(false);
        self.state.lives = self.state.lives.saturating_sub(1);

        log::debug!(
            "level {} failed ({:?}), {} lives left",
            level.id,
            result.reason,
            self.state.lives
        );

        if self.state.lives == 0 {
            self.state.status = GameStatus::GameOver;
            self.persist_high_score();
        } else {
            self.state.status = GameStatus::Failed;
        }
    }

    // --- recovery paths -------------------------------------------------

    /// Resume after a fail: replay the same level number without consuming
    /// another life.
    pub fn continue_game(&mut self) {
        if self.state.status != GameStatus::Failed {
            return;
        }
        self.start_level();
    }

    /// Restart the current mode from scratch.
    pub fn retry(&mut self) {
        let lives = match self.mode {
            GameMode::Hardcore => HARDCORE_LIVES,
            _ => START_LIVES,
        };
        self.begin_run(self.mode, lives);
    }

    /// Back to the idle/menu state. Cancels all timers and pending
    /// transitions and restores the initial state.
    pub fn reset_game(&mut self) {
        self.cancel_timers();
        self.mode = GameMode::Classic;
        self.state = GameState::new(START_LIVES);
        self.history = SessionHistory::default();
        self.level = None;
    }

    // --- persistence ----------------------------------------------------

    fn persist_high_score(&mut self) {
        if self.progress.qualifies(self.state.score) {
            self.progress.high_score = self.state.score;
            self.store.save(&self.progress);
            log::info!("new high score: {}", self.state.score);
        }
    }

    fn persist_chapter(&mut self, id: u32) {
        self.progress.merge_chapter(ChapterRecord {
            chapter_id: id,
            completed: true,
            best_score: self.state.score,
        });
        self.store.save(&self.progress);
        log::info!("chapter {} complete with score {}", id, self.state.score);
    }

    // --- read-only outputs ----------------------------------------------

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    /// Countdown fraction remaining, for ring-timer rendering.
    pub fn progress(&self) -> f32 {
        match &self.level {
            Some(level) if level.time_limit_ms > 0 => {
                (self.state.time_remaining_ms.max(0) as f32 / level.time_limit_ms as f32)
                    .clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn high_score(&self) -> u64 {
        self.progress.high_score
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Merge a validator-supplied memory update, skipping values the level
/// already folded in at start so histories stay duplicate-free.
fn apply_memory_update(memory: &Memory, update: MemoryUpdate) -> Memory {
    let mut next = memory.clone();
    if let Some(n) = update.number {
        if next.number_history.last() != Some(&n) {
            next = next.remembering_number(n);
        }
    }
    if let Some(icon) = update.icon {
        if next.icon_history.last() != Some(&icon) {
            next = next.remembering_icon(icon);
        }
    }
    next
}

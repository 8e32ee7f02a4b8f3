//! Reflex Rush - a timed reflex/attention mini-game engine
//!
//! Core modules:
//! - `game`: Level generation, rule validation, difficulty, session state machine
//! - `progress`: High score and chapter-completion persistence
//!
//! Rendering, haptics, and navigation are external collaborators; this crate
//! owns only the parts where incorrect logic would make the game unfair.

pub mod game;
pub mod progress;

pub use game::rules::{Action, ErrorReason, ValidationResult};
pub use game::session::GameSession;
pub use game::state::{GameState, GameStatus, Memory};
pub use progress::{InMemoryStore, ProgressStore};

/// Game configuration constants
pub mod consts {
    /// Countdown tick interval (ms). The timer is best-effort wall-clock
    /// driven; callers should not assume sub-tick precision.
    pub const TICK_MS: u32 = 50;

    /// Delay between level-complete and the next level starting (ms)
    pub const TRANSITION_DELAY_MS: u32 = 800;

    /// Base points awarded per completed level
    pub const BASE_SCORE: u64 = 100;

    /// Starting lives (classic / chapter / endless)
    pub const START_LIVES: u8 = 3;
    /// Starting lives in hardcore mode
    pub const HARDCORE_LIVES: u8 = 1;

    /// Rolling memory history bound (remembered numbers / icons)
    pub const MEMORY_HISTORY_LEN: usize = 5;
    /// Anti-repeat window for recently used rules and categories
    pub const ANTI_REPEAT_LEN: usize = 3;
    /// Recent-results window consulted by the rescue policy
    pub const RECENT_RESULTS_LEN: usize = 5;

    /// Hard floor for any adjusted level time (ms)
    pub const MIN_LEVEL_TIME_MS: u32 = 1400;
    /// Floor for the base-time decay past level 40 (ms)
    pub const DECAY_FLOOR_MS: u32 = 1500;

    /// Levels per chapter before `ChapterComplete`
    pub const CHAPTER_SCREEN_QUOTA: u32 = 10;
}

//! Deterministic gameplay module
//!
//! All game logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Single serialized update path through `GameSession`
//! - No rendering or platform dependencies

pub mod devtools;
pub mod difficulty;
pub mod levels;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod stages;
pub mod state;

pub use difficulty::{DifficultyConfig, PerfContext, adjust_time_for_performance, difficulty_config, should_rescue};
pub use levels::{Category, Icon, Level, ScreenKind, generate_level};
pub use rules::{Action, ErrorReason, RuleId, RuleParams, ValidationResult, validate};
pub use scoring::{calculate_combo, calculate_score};
pub use session::{GameMode, GameSession};
pub use state::{GameState, GameStatus, Memory, SessionHistory};

//! Session state and cross-level memory
//!
//! All state that must survive across levels lives here. `Memory` follows a
//! replace-not-mutate discipline: transitions build a new value from the old
//! one, so presentation layers holding a snapshot never observe a half-applied
//! update.

use serde::{Deserialize, Serialize};

use super::levels::{Category, Icon};
use super::rules::{Action, RuleId};
use crate::consts::{ANTI_REPEAT_LEN, MEMORY_HISTORY_LEN, RECENT_RESULTS_LEN, START_LIVES};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Entry/reset state, no level active
    #[default]
    Idle,
    /// A level is live and the countdown is running
    Playing,
    /// Level failed, awaiting continue/retry/menu
    Failed,
    /// Level passed, transition to the next level pending
    LevelComplete,
    /// Run ended (lives exhausted)
    GameOver,
    /// Chapter screen quota met
    ChapterComplete,
}

/// The play that would have satisfied the previous level's rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectPlay {
    /// Tapping (at least once) was the right call
    Tap,
    /// Waiting out the timer was the right call
    Wait,
}

/// Cross-level memory consumed by recall/repeat rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Memory {
    /// Last remembered number
    pub number: Option<u8>,
    /// Last remembered icon
    pub icon: Option<Icon>,
    /// Rolling history of remembered numbers, newest last, bounded to 5
    pub number_history: Vec<u8>,
    /// Rolling history of remembered icons, newest last, bounded to 5
    pub icon_history: Vec<Icon>,
    /// Rule of the previously completed level
    pub previous_rule: Option<RuleId>,
    /// Most recent non-timer action the player performed
    pub previous_action: Option<Action>,
    /// The play that satisfied the previous level
    pub previous_correct_action: Option<CorrectPlay>,
    /// Failures accumulated over the whole run
    pub error_count: u32,
    /// Taps accumulated over the whole run
    pub total_taps: u64,
}

impl Memory {
    /// New memory with a number folded in, history trimmed to the last 5.
    pub fn remembering_number(&self, n: u8) -> Memory {
        let mut next = self.clone();
        next.number = Some(n);
        next.number_history.push(n);
        trim_front(&mut next.number_history, MEMORY_HISTORY_LEN);
        next
    }

    /// New memory with an icon folded in, history trimmed to the last 5.
    pub fn remembering_icon(&self, icon: Icon) -> Memory {
        let mut next = self.clone();
        next.icon = Some(icon);
        next.icon_history.push(icon);
        trim_front(&mut next.icon_history, MEMORY_HISTORY_LEN);
        next
    }

    /// New memory recording the latest player action.
    pub fn with_action(&self, action: Action) -> Memory {
        let mut next = self.clone();
        next.previous_action = Some(action);
        if action == Action::Tap {
            next.total_taps += 1;
        }
        next
    }

    /// New memory after a completed level: bookkeeping for repeat/recall.
    pub fn after_complete(&self, rule: RuleId, taps_this_level: u32) -> Memory {
        let mut next = self.clone();
        next.previous_rule = Some(rule);
        next.previous_correct_action = Some(if taps_this_level > 0 {
            CorrectPlay::Tap
        } else {
            CorrectPlay::Wait
        });
        next
    }

    /// New memory after a failed level.
    pub fn after_fail(&self, rule: RuleId) -> Memory {
        let mut next = self.clone();
        next.previous_rule = Some(rule);
        next.error_count += 1;
        next
    }
}

fn trim_front<T>(v: &mut Vec<T>, max: usize) {
    while v.len() > max {
        v.remove(0);
    }
}

/// Rolling per-session history feeding anti-repeat and the rescue policy.
///
/// Owned by the session value, never module-level, so concurrent sessions
/// (e.g. tests) cannot interfere with each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Rules of the last few generated levels, newest last
    pub recent_rules: Vec<RuleId>,
    /// Categories of the last few generated levels, newest last
    pub recent_categories: Vec<Category>,
    /// Pass/fail of the last few resolved levels, newest last
    pub recent_results: Vec<bool>,
    /// Levels completed in the active chapter
    pub chapter_screens: u32,
}

impl SessionHistory {
    /// Record a generated level's rule and category for anti-repeat.
    pub fn record_generated(&mut self, rule: RuleId, category: Category) {
        self.recent_rules.push(rule);
        trim_front(&mut self.recent_rules, ANTI_REPEAT_LEN);
        self.recent_categories.push(category);
        trim_front(&mut self.recent_categories, ANTI_REPEAT_LEN);
    }

    /// Record a level outcome for the rescue policy.
    pub fn record_result(&mut self, passed: bool) {
        self.recent_results.push(passed);
        trim_front(&mut self.recent_results, RECENT_RESULTS_LEN);
    }

    /// Failures among the recent-results window.
    pub fn recent_errors(&self) -> u32 {
        self.recent_results.iter().filter(|r| !**r).count() as u32
    }
}

/// Complete session state (serializable snapshot for presentation layers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub status: GameStatus,
    /// Level counter (1-based once a run starts)
    pub current_level: u32,
    /// Run score
    pub score: u64,
    /// Remaining lives
    pub lives: u8,
    /// Taps recorded for the live level; reset each level
    pub tap_count: u32,
    /// Countdown remaining (ms); may briefly read negative at expiry
    pub time_remaining_ms: i32,
    /// Consecutive-success streak
    pub combo: u32,
    /// Cross-level memory
    pub memory: Memory,
}

impl GameState {
    /// Fresh state for a new run.
    pub fn new(lives: u8) -> Self {
        Self {
            status: GameStatus::Idle,
            current_level: 0,
            score: 0,
            lives,
            tap_count: 0,
            time_remaining_ms: 0,
            combo: 0,
            memory: Memory::default(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(START_LIVES)
    }
}

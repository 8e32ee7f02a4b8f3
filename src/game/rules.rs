//! Rule registry and validators
//!
//! Each rule is a pure function `(level, state, action) -> ValidationResult`:
//! a tiny state machine keyed off the live tap count and the incoming action.
//! Validators are total - an unknown rule name or a params/rule mismatch
//! degrades to a failing result instead of panicking, because a panic here
//! would take down an active session.

use serde::{Deserialize, Serialize};

use super::levels::{Icon, Level, StroopColor};
use super::state::{CorrectPlay, GameState};

/// Player/system actions fed into validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A single screen tap
    Tap,
    /// Finger down on a hold screen
    HoldStart,
    /// Finger up on a hold screen; duration measured by the caller
    HoldEnd { held_ms: u32 },
    /// Synthesized by the session when the countdown reaches zero
    TimerExpired,
    /// Device rotated (orientation change)
    Rotate,
    /// Simultaneous touches currently on screen
    MultiTouch { touches: u8 },
}

/// Why a level was failed. Gameplay outcomes, not exceptions; all reasons
/// cost one life and reset the combo identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    WrongCount,
    TappedWhenShouldnt,
    TimeExpired,
    TooSlow,
    WrongAnswer,
}

/// Values a validator wants folded into cross-level memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryUpdate {
    pub number: Option<u8>,
    pub icon: Option<Icon>,
}

/// Outcome of a single validation call.
///
/// `passed == false` with no `reason` means "inconclusive, keep waiting" -
/// used mid-sequence by the counting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub reason: Option<ErrorReason>,
    pub memory_update: Option<MemoryUpdate>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
            memory_update: None,
        }
    }

    pub fn pass_with(update: MemoryUpdate) -> Self {
        Self {
            passed: true,
            reason: None,
            memory_update: Some(update),
        }
    }

    pub fn fail(reason: ErrorReason) -> Self {
        Self {
            passed: false,
            reason: Some(reason),
            memory_update: None,
        }
    }

    /// Keep waiting; the level is not yet resolved.
    pub fn pending() -> Self {
        Self {
            passed: false,
            reason: None,
            memory_update: None,
        }
    }

    /// True when this result resolves the level one way or the other.
    pub fn is_resolved(&self) -> bool {
        self.passed || self.reason.is_some()
    }
}

/// Registered rule identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    TapOnce,
    TapNTimes,
    DoubleTap,
    DontTap,
    Opposite,
    RememberNumber,
    RememberIcon,
    RecallNumber,
    RecallIcon,
    MathTap,
    RepeatPrevious,
    Stroop,
    FakeCrash,
    Hold,
    Rotate,
    MultiTouch,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TapOnce => "tap_once",
            RuleId::TapNTimes => "tap_n_times",
            RuleId::DoubleTap => "double_tap",
            RuleId::DontTap => "dont_tap",
            RuleId::Opposite => "opposite",
            RuleId::RememberNumber => "remember_number",
            RuleId::RememberIcon => "remember_icon",
            RuleId::RecallNumber => "recall_number",
            RuleId::RecallIcon => "recall_icon",
            RuleId::MathTap => "math_tap",
            RuleId::RepeatPrevious => "repeat_previous",
            RuleId::Stroop => "stroop",
            RuleId::FakeCrash => "fake_crash",
            RuleId::Hold => "hold",
            RuleId::Rotate => "rotate",
            RuleId::MultiTouch => "multi_touch",
        }
    }

    /// Resolve a rule name; unknown names return `None` and validation of
    /// such a level fails closed.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "tap_once" => Some(RuleId::TapOnce),
            "tap_n_times" => Some(RuleId::TapNTimes),
            "double_tap" => Some(RuleId::DoubleTap),
            "dont_tap" => Some(RuleId::DontTap),
            "opposite" => Some(RuleId::Opposite),
            "remember_number" => Some(RuleId::RememberNumber),
            "remember_icon" => Some(RuleId::RememberIcon),
            "recall_number" => Some(RuleId::RecallNumber),
            "recall_icon" => Some(RuleId::RecallIcon),
            "math_tap" => Some(RuleId::MathTap),
            "repeat_previous" => Some(RuleId::RepeatPrevious),
            "stroop" => Some(RuleId::Stroop),
            "fake_crash" => Some(RuleId::FakeCrash),
            "hold" => Some(RuleId::Hold),
            "rotate" => Some(RuleId::Rotate),
            "multi_touch" => Some(RuleId::MultiTouch),
            _ => None,
        }
    }
}

/// Rule-specific parameters, one variant per rule family.
///
/// The generator must produce the variant matching the chosen rule; the
/// dispatch below fails closed on a mismatch rather than reading loose keys
/// out of an untyped bag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleParams {
    #[default]
    None,
    TapNTimes {
        count: u32,
    },
    /// count 0: the instruction said "don't tap", correct play is one tap.
    /// count 1: the instruction said "tap once", correct play is no tap.
    Opposite {
        count: u32,
    },
    RememberNumber {
        number: u8,
    },
    RememberIcon {
        icon: Icon,
    },
    RecallIcon {
        target_icon: Icon,
    },
    MathTap {
        answer: u32,
        /// Decoy shown to the player; never consulted by validation
        displayed: u32,
    },
    Stroop {
        word: StroopColor,
        ink: StroopColor,
        target: StroopColor,
        /// Resolved at generation time: ink matches the target
        should_tap: bool,
    },
    Hold {
        min_ms: u32,
    },
    MultiTouch {
        fingers: u8,
    },
}

/// Validate the latest action against the live level.
///
/// Pure and side-effect free; callable repeatedly with the same inputs.
/// The session increments `state.tap_count` before calling, so validators
/// observe the count as it stands after this action.
pub fn validate(level: &Level, state: &GameState, action: Action) -> ValidationResult {
    match (level.rule, level.params) {
        (RuleId::TapOnce, _) => tap_exactly(1, state, action, ErrorReason::WrongCount),
        (RuleId::DoubleTap, _) => tap_exactly(2, state, action, ErrorReason::WrongCount),
        (RuleId::TapNTimes, RuleParams::TapNTimes { count }) => {
            tap_exactly(count, state, action, ErrorReason::WrongCount)
        }
        (RuleId::DontTap, _) => dont_tap(action),
        (RuleId::Opposite, RuleParams::Opposite { count }) => {
            // Inverts the displayed instruction's literal meaning
            if count == 0 {
                tap_exactly(1, state, action, ErrorReason::WrongCount)
            } else {
                dont_tap(action)
            }
        }
        (RuleId::RememberNumber, RuleParams::RememberNumber { number }) => {
            remember(action, MemoryUpdate {
                number: Some(number),
                icon: None,
            })
        }
        (RuleId::RememberIcon, RuleParams::RememberIcon { icon }) => {
            remember(action, MemoryUpdate {
                number: None,
                icon: Some(icon),
            })
        }
        (RuleId::RecallNumber, _) => recall_number(state, action),
        (RuleId::RecallIcon, RuleParams::RecallIcon { target_icon }) => {
            if state.memory.icon == Some(target_icon) {
                // Match: one tap is the correct play
                match action {
                    Action::Tap => ValidationResult::pass(),
                    Action::TimerExpired => ValidationResult::fail(ErrorReason::TooSlow),
                    _ => ValidationResult::pending(),
                }
            } else {
                dont_tap(action)
            }
        }
        (RuleId::MathTap, RuleParams::MathTap { answer, .. }) => {
            tap_exactly(answer, state, action, ErrorReason::WrongAnswer)
        }
        (RuleId::RepeatPrevious, _) => {
            // No prior history defaults to tap-once
            match state.memory.previous_correct_action {
                Some(CorrectPlay::Wait) => dont_tap(action),
                _ => tap_exactly(1, state, action, ErrorReason::WrongCount),
            }
        }
        (RuleId::Stroop, RuleParams::Stroop { should_tap, .. }) => {
            if should_tap {
                tap_exactly(1, state, action, ErrorReason::WrongCount)
            } else {
                dont_tap(action)
            }
        }
        (RuleId::FakeCrash, _) => match action {
            Action::Tap => ValidationResult::pass(),
            Action::TimerExpired => ValidationResult::fail(ErrorReason::TooSlow),
            _ => ValidationResult::pending(),
        },
        (RuleId::Hold, RuleParams::Hold { min_ms }) => match action {
            Action::HoldEnd { held_ms } if held_ms >= min_ms => ValidationResult::pass(),
            Action::HoldEnd { .. } => ValidationResult::fail(ErrorReason::TooSlow),
            Action::TimerExpired => ValidationResult::fail(ErrorReason::TimeExpired),
            _ => ValidationResult::pending(),
        },
        (RuleId::Rotate, _) => match action {
            Action::Rotate => ValidationResult::pass(),
            Action::TimerExpired => ValidationResult::fail(ErrorReason::TimeExpired),
            _ => ValidationResult::pending(),
        },
        (RuleId::MultiTouch, RuleParams::MultiTouch { fingers }) => match action {
            Action::MultiTouch { touches } if touches >= fingers => ValidationResult::pass(),
            Action::TimerExpired => ValidationResult::fail(ErrorReason::TimeExpired),
            _ => ValidationResult::pending(),
        },
        // Params don't match the rule: fail closed rather than guess
        (rule, params) => {
            log::warn!("rule {:?} got mismatched params {:?}", rule, params);
            ValidationResult {
                passed: false,
                reason: Some(ErrorReason::TimeExpired),
                memory_update: None,
            }
        }
    }
}

/// Shape shared by the counting rules: taps never resolve, the expiry check
/// compares the final count against the target.
fn tap_exactly(
    target: u32,
    state: &GameState,
    action: Action,
    mismatch: ErrorReason,
) -> ValidationResult {
    match action {
        Action::Tap => ValidationResult::pending(),
        Action::TimerExpired => {
            if state.tap_count == target {
                ValidationResult::pass()
            } else {
                ValidationResult::fail(mismatch)
            }
        }
        _ => ValidationResult::pending(),
    }
}

/// Shape shared by the inhibition rules: any tap is an immediate fail,
/// waiting out the timer passes.
fn dont_tap(action: Action) -> ValidationResult {
    match action {
        Action::Tap => ValidationResult::fail(ErrorReason::TappedWhenShouldnt),
        Action::TimerExpired => ValidationResult::pass(),
        _ => ValidationResult::pending(),
    }
}

/// Shape shared by the remember rules: exists purely to write memory, so the
/// only way to pass is to leave the screen alone.
fn remember(action: Action, update: MemoryUpdate) -> ValidationResult {
    match action {
        Action::Tap => ValidationResult::fail(ErrorReason::TappedWhenShouldnt),
        Action::TimerExpired => ValidationResult::pass_with(update),
        _ => ValidationResult::pending(),
    }
}

/// Recall: passes the instant the count reaches the remembered number,
/// overshoot or a short count at expiry is a wrong answer.
fn recall_number(state: &GameState, action: Action) -> ValidationResult {
    let Some(target) = state.memory.number else {
        // Nothing remembered; generator filtering should prevent this, but
        // degrade to a resolvable level rather than an unwinnable one.
        return match action {
            Action::TimerExpired => ValidationResult::fail(ErrorReason::WrongAnswer),
            _ => ValidationResult::pending(),
        };
    };
    let target = target as u32;
    match action {
        Action::Tap if state.tap_count == target => ValidationResult::pass(),
        Action::Tap if state.tap_count > target => ValidationResult::fail(ErrorReason::WrongAnswer),
        Action::Tap => ValidationResult::pending(),
        Action::TimerExpired => {
            if state.tap_count == target {
                ValidationResult::pass()
            } else {
                ValidationResult::fail(ErrorReason::WrongAnswer)
            }
        }
        _ => ValidationResult::pending(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::levels::{Category, Level, ScreenKind};

    fn level(rule: RuleId, params: RuleParams) -> Level {
        Level {
            id: 1,
            instruction: String::new(),
            rule,
            params,
            time_limit_ms: 3000,
            category: Category::Tap,
            screen: ScreenKind::Tap,
            difficulty: 1,
            requires_memory: false,
            requires_previous: false,
            requires_device: false,
        }
    }

    fn state_with_taps(taps: u32) -> GameState {
        let mut state = GameState::default();
        state.tap_count = taps;
        state
    }

    #[test]
    fn test_tap_n_times_shape() {
        let lvl = level(RuleId::TapNTimes, RuleParams::TapNTimes { count: 3 });

        // First two taps: inconclusive, keep waiting
        for taps in 1..=2 {
            let r = validate(&lvl, &state_with_taps(taps), Action::Tap);
            assert!(!r.passed);
            assert_eq!(r.reason, None);
        }
        // Expiry at the target count passes
        let r = validate(&lvl, &state_with_taps(3), Action::TimerExpired);
        assert!(r.passed);
        // A fourth tap never resolves by itself...
        let r = validate(&lvl, &state_with_taps(4), Action::Tap);
        assert!(!r.is_resolved());
        // ...but the eventual check fails it
        let r = validate(&lvl, &state_with_taps(4), Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::WrongCount));
    }

    #[test]
    fn test_dont_tap_shape() {
        let lvl = level(RuleId::DontTap, RuleParams::None);
        let r = validate(&lvl, &state_with_taps(1), Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::TappedWhenShouldnt));
        let r = validate(&lvl, &state_with_taps(0), Action::TimerExpired);
        assert!(r.passed);
    }

    #[test]
    fn test_opposite_inverts_instruction() {
        // count 0: screen said "don't tap", correct play is one tap
        let lvl = level(RuleId::Opposite, RuleParams::Opposite { count: 0 });
        assert!(validate(&lvl, &state_with_taps(1), Action::TimerExpired).passed);
        // count 1: screen said "tap once", correct play is no tap
        let lvl = level(RuleId::Opposite, RuleParams::Opposite { count: 1 });
        let r = validate(&lvl, &state_with_taps(1), Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::TappedWhenShouldnt));
        assert!(validate(&lvl, &state_with_taps(0), Action::TimerExpired).passed);
    }

    #[test]
    fn test_remember_number_writes_memory_on_expiry() {
        let lvl = level(
            RuleId::RememberNumber,
            RuleParams::RememberNumber { number: 4 },
        );
        let r = validate(&lvl, &state_with_taps(0), Action::TimerExpired);
        assert!(r.passed);
        assert_eq!(r.memory_update.and_then(|u| u.number), Some(4));
        // Any tap is an immediate fail
        let r = validate(&lvl, &state_with_taps(1), Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::TappedWhenShouldnt));
    }

    #[test]
    fn test_recall_number_instant_pass_and_overshoot() {
        let lvl = level(RuleId::RecallNumber, RuleParams::None);
        let mut state = GameState::default();
        state.memory = state.memory.remembering_number(3);

        state.tap_count = 2;
        assert!(!validate(&lvl, &state, Action::Tap).is_resolved());
        state.tap_count = 3;
        assert!(validate(&lvl, &state, Action::Tap).passed);
        state.tap_count = 4;
        let r = validate(&lvl, &state, Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::WrongAnswer));
        // Short count at expiry is also wrong
        state.tap_count = 1;
        let r = validate(&lvl, &state, Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::WrongAnswer));
    }

    #[test]
    fn test_recall_icon_branches_on_match() {
        let lvl = level(
            RuleId::RecallIcon,
            RuleParams::RecallIcon {
                target_icon: Icon::Star,
            },
        );
        let mut state = GameState::default();
        state.memory = state.memory.remembering_icon(Icon::Star);

        // Match: tap passes, waiting is too slow
        state.tap_count = 1;
        assert!(validate(&lvl, &state, Action::Tap).passed);
        state.tap_count = 0;
        let r = validate(&lvl, &state, Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::TooSlow));

        // Mismatch: correct play is to wait
        state.memory = state.memory.remembering_icon(Icon::Moon);
        assert!(validate(&lvl, &state, Action::TimerExpired).passed);
        state.tap_count = 1;
        let r = validate(&lvl, &state, Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::TappedWhenShouldnt));
    }

    #[test]
    fn test_math_tap_ignores_decoy() {
        let lvl = level(
            RuleId::MathTap,
            RuleParams::MathTap {
                answer: 4,
                displayed: 7,
            },
        );
        assert!(validate(&lvl, &state_with_taps(4), Action::TimerExpired).passed);
        let r = validate(&lvl, &state_with_taps(7), Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::WrongAnswer));
    }

    #[test]
    fn test_repeat_previous_defaults_to_tap_once() {
        let lvl = level(RuleId::RepeatPrevious, RuleParams::None);
        assert!(validate(&lvl, &state_with_taps(1), Action::TimerExpired).passed);

        let mut state = state_with_taps(0);
        state.memory = state.memory.after_complete(RuleId::DontTap, 0);
        assert!(validate(&lvl, &state, Action::TimerExpired).passed);
        state.tap_count = 1;
        let r = validate(&lvl, &state, Action::Tap);
        assert_eq!(r.reason, Some(ErrorReason::TappedWhenShouldnt));
    }

    #[test]
    fn test_fake_crash_rewards_the_first_tap() {
        let lvl = level(RuleId::FakeCrash, RuleParams::None);
        assert!(validate(&lvl, &state_with_taps(1), Action::Tap).passed);
        let r = validate(&lvl, &state_with_taps(0), Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::TooSlow));
    }

    #[test]
    fn test_hold_thresholds_live_in_the_rule() {
        let lvl = level(RuleId::Hold, RuleParams::Hold { min_ms: 1000 });
        let state = state_with_taps(0);
        assert!(!validate(&lvl, &state, Action::HoldStart).is_resolved());
        assert!(validate(&lvl, &state, Action::HoldEnd { held_ms: 1200 }).passed);
        let r = validate(&lvl, &state, Action::HoldEnd { held_ms: 400 });
        assert_eq!(r.reason, Some(ErrorReason::TooSlow));
        let r = validate(&lvl, &state, Action::TimerExpired);
        assert_eq!(r.reason, Some(ErrorReason::TimeExpired));
    }

    #[test]
    fn test_device_rules() {
        let lvl = level(RuleId::Rotate, RuleParams::None);
        assert!(validate(&lvl, &state_with_taps(0), Action::Rotate).passed);
        let lvl = level(RuleId::MultiTouch, RuleParams::MultiTouch { fingers: 2 });
        assert!(validate(&lvl, &state_with_taps(0), Action::MultiTouch { touches: 3 }).passed);
        let r = validate(&lvl, &state_with_taps(0), Action::MultiTouch { touches: 1 });
        assert!(!r.is_resolved());
    }

    #[test]
    fn test_params_mismatch_fails_closed() {
        // Stroop rule handed tap params: must fail, never panic
        let lvl = level(RuleId::Stroop, RuleParams::TapNTimes { count: 2 });
        let r = validate(&lvl, &state_with_taps(0), Action::Tap);
        assert!(!r.passed);
        assert!(r.reason.is_some());
    }

    #[test]
    fn test_unknown_rule_name_fails_lookup() {
        assert_eq!(RuleId::lookup("tap_once"), Some(RuleId::TapOnce));
        assert_eq!(RuleId::lookup("no_such_rule"), None);
    }
}

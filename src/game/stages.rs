//! Hand-authored stage sequences for the guided campaign
//!
//! Stages are fixed scripts of five levels each; once the script runs out the
//! session falls back to the random generator. Stage times still pass through
//! the performance adjustment so rescue time applies everywhere.

use super::difficulty::{PerfContext, adjust_time_for_performance};
use super::levels::{Category, Icon, Level, ScreenKind, StroopColor};
use super::rules::{RuleId, RuleParams};

/// Levels per stage
pub const STAGE_LEN: u32 = 5;

/// One scripted level
#[derive(Debug, Clone, Copy)]
pub struct StageEntry {
    pub instruction: &'static str,
    pub rule: RuleId,
    pub params: RuleParams,
    pub time_limit_ms: u32,
    pub category: Category,
    pub screen: ScreenKind,
}

/// A named campaign segment
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub entries: [StageEntry; STAGE_LEN as usize],
}

const fn entry(
    instruction: &'static str,
    rule: RuleId,
    params: RuleParams,
    time_limit_ms: u32,
    category: Category,
    screen: ScreenKind,
) -> StageEntry {
    StageEntry {
        instruction,
        rule,
        params,
        time_limit_ms,
        category,
        screen,
    }
}

/// The campaign script. The very first entry is the canonical opener:
/// "Tap once" with a 4000 ms budget.
pub const STAGES: &[Stage] = &[
    Stage {
        name: "warmup",
        entries: [
            entry("Tap once", RuleId::TapOnce, RuleParams::None, 4000, Category::Tap, ScreenKind::Tap),
            entry("Don't tap!", RuleId::DontTap, RuleParams::None, 4000, Category::Inhibition, ScreenKind::Tap),
            entry("Double tap!", RuleId::DoubleTap, RuleParams::None, 4000, Category::Tap, ScreenKind::Tap),
            entry(
                "Tap 3 times",
                RuleId::TapNTimes,
                RuleParams::TapNTimes { count: 3 },
                4000,
                Category::Tap,
                ScreenKind::Tap,
            ),
            entry("Tap once", RuleId::TapOnce, RuleParams::None, 3500, Category::Tap, ScreenKind::Tap),
        ],
    },
    Stage {
        name: "trickster",
        entries: [
            entry("Don't tap!", RuleId::DontTap, RuleParams::None, 3500, Category::Inhibition, ScreenKind::Tap),
            entry(
                "OPPOSITE DAY: Don't tap!",
                RuleId::Opposite,
                RuleParams::Opposite { count: 0 },
                3500,
                Category::Trick,
                ScreenKind::Tap,
            ),
            entry(
                "Tap 4 times",
                RuleId::TapNTimes,
                RuleParams::TapNTimes { count: 4 },
                3500,
                Category::Tap,
                ScreenKind::Tap,
            ),
            entry(
                "ERR 0x5F3B: SYSTEM HALTED",
                RuleId::FakeCrash,
                RuleParams::None,
                3000,
                Category::Trick,
                ScreenKind::Crash,
            ),
            entry(
                "OPPOSITE DAY: Tap once",
                RuleId::Opposite,
                RuleParams::Opposite { count: 1 },
                3500,
                Category::Trick,
                ScreenKind::Tap,
            ),
        ],
    },
    Stage {
        name: "memory-lane",
        entries: [
            entry(
                "Remember: 4",
                RuleId::RememberNumber,
                RuleParams::RememberNumber { number: 4 },
                3500,
                Category::Memory,
                ScreenKind::Memory,
            ),
            entry(
                "Tap the number you remembered",
                RuleId::RecallNumber,
                RuleParams::None,
                3500,
                Category::Memory,
                ScreenKind::Memory,
            ),
            entry(
                "Remember: star",
                RuleId::RememberIcon,
                RuleParams::RememberIcon { icon: Icon::Star },
                3200,
                Category::Memory,
                ScreenKind::Memory,
            ),
            entry(
                "Did you see the star? Tap if yes",
                RuleId::RecallIcon,
                RuleParams::RecallIcon {
                    target_icon: Icon::Star,
                },
                3200,
                Category::Memory,
                ScreenKind::Memory,
            ),
            entry(
                "Do what you did last time",
                RuleId::RepeatPrevious,
                RuleParams::None,
                3200,
                Category::Trick,
                ScreenKind::Tap,
            ),
        ],
    },
    Stage {
        name: "crunch-time",
        entries: [
            entry(
                "2 + 2 = 5. Tap the real answer!",
                RuleId::MathTap,
                RuleParams::MathTap {
                    answer: 4,
                    displayed: 5,
                },
                3200,
                Category::Math,
                ScreenKind::Math,
            ),
            entry(
                "Hold for 1.0s",
                RuleId::Hold,
                RuleParams::Hold { min_ms: 1000 },
                3000,
                Category::Tap,
                ScreenKind::Hold,
            ),
            entry(
                "Tap 5 times",
                RuleId::TapNTimes,
                RuleParams::TapNTimes { count: 5 },
                3000,
                Category::Tap,
                ScreenKind::Tap,
            ),
            entry(
                "Tap if 'RED' is written in BLUE",
                RuleId::Stroop,
                RuleParams::Stroop {
                    word: StroopColor::Red,
                    ink: StroopColor::Blue,
                    target: StroopColor::Blue,
                    should_tap: true,
                },
                3000,
                Category::Trick,
                ScreenKind::Stroop,
            ),
            entry("Don't tap!", RuleId::DontTap, RuleParams::None, 2500, Category::Inhibition, ScreenKind::Tap),
        ],
    },
];

/// Total scripted levels before the campaign falls back to random generation
pub fn stage_level_count() -> u32 {
    STAGES.len() as u32 * STAGE_LEN
}

/// Look up the scripted level for a 1-based level number, if the campaign
/// script still covers it.
pub fn stage_level(level_number: u32, perf: &PerfContext) -> Option<Level> {
    if level_number == 0 {
        return None;
    }
    let index = level_number - 1;
    let stage = STAGES.get((index / STAGE_LEN) as usize)?;
    let entry = &stage.entries[(index % STAGE_LEN) as usize];

    Some(Level {
        id: level_number,
        instruction: entry.instruction.to_string(),
        rule: entry.rule,
        params: entry.params,
        time_limit_ms: adjust_time_for_performance(entry.time_limit_ms, perf),
        category: entry.category,
        screen: entry.screen,
        difficulty: 1,
        requires_memory: matches!(entry.rule, RuleId::RecallNumber | RuleId::RecallIcon),
        requires_previous: matches!(entry.rule, RuleId::RepeatPrevious),
        requires_device: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opener_is_tap_once_at_4000() {
        let perf = PerfContext::default();
        let level = stage_level(1, &perf).unwrap();
        assert_eq!(level.instruction, "Tap once");
        assert_eq!(level.rule, RuleId::TapOnce);
        assert_eq!(level.time_limit_ms, 4000);
    }

    #[test]
    fn test_script_exhausts_after_all_stages() {
        let perf = PerfContext::default();
        let last = stage_level_count();
        assert!(stage_level(last, &perf).is_some());
        assert!(stage_level(last + 1, &perf).is_none());
        assert!(stage_level(0, &perf).is_none());
    }

    #[test]
    fn test_remember_precedes_recall_within_script() {
        // Every scripted recall must come after a matching remember
        let mut number_seen = false;
        let mut icon_seen = false;
        for stage in STAGES {
            for e in &stage.entries {
                match e.rule {
                    RuleId::RememberNumber => number_seen = true,
                    RuleId::RememberIcon => icon_seen = true,
                    RuleId::RecallNumber => assert!(number_seen),
                    RuleId::RecallIcon => assert!(icon_seen),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_combo_streak_trims_stage_time() {
        let perf = PerfContext {
            combo: 5,
            recent_errors: 0,
            chapter: None,
        };
        let level = stage_level(2, &perf).unwrap();
        // -40*5 - 80 = -280 off the scripted 4000
        assert_eq!(level.time_limit_ms, 3720);
    }
}

//! Level templates and the random generator
//!
//! A level is an immutable challenge descriptor stamped out from a static
//! template pool. The generator filters the pool by the difficulty policy,
//! avoids recently used rules/categories, resolves dynamic parameters, and
//! builds the instruction text by typed formatting (never placeholder
//! scanning).

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{PerfContext, adjust_time_for_performance, difficulty_config, should_rescue};
use super::rules::{RuleId, RuleParams};
use super::state::{Memory, SessionHistory};

/// Challenge categories used for difficulty gating and anti-repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Plain counting taps
    Tap,
    /// Don't-tap / impulse control
    Inhibition,
    /// Inverted or misleading instructions
    Trick,
    /// Remember/recall pairs
    Memory,
    /// Arithmetic with a decoy
    Math,
    /// Rotation / multi-touch screens
    Device,
}

/// Which presentation screen a level renders on (selection only; validation
/// never consults it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Tap,
    Hold,
    Memory,
    Math,
    Stroop,
    Crash,
    Device,
}

/// The six icon tokens used by remember/recall levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Star,
    Heart,
    Moon,
    Sun,
    Cloud,
    Bolt,
}

impl Icon {
    pub const ALL: [Icon; 6] = [
        Icon::Star,
        Icon::Heart,
        Icon::Moon,
        Icon::Sun,
        Icon::Cloud,
        Icon::Bolt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Star => "star",
            Icon::Heart => "heart",
            Icon::Moon => "moon",
            Icon::Sun => "sun",
            Icon::Cloud => "cloud",
            Icon::Bolt => "bolt",
        }
    }
}

/// Colors used by Stroop levels (both as words and as ink)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StroopColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl StroopColor {
    pub const ALL: [StroopColor; 4] = [
        StroopColor::Red,
        StroopColor::Green,
        StroopColor::Blue,
        StroopColor::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StroopColor::Red => "RED",
            StroopColor::Green => "GREEN",
            StroopColor::Blue => "BLUE",
            StroopColor::Yellow => "YELLOW",
        }
    }
}

/// One timed challenge. Created once by a generator, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Sequence number within the run
    pub id: u32,
    /// Display text with all parameter values already resolved
    pub instruction: String,
    /// Validator selector
    pub rule: RuleId,
    /// Rule-specific parameters, variant matching `rule`
    pub params: RuleParams,
    /// Countdown budget (ms)
    pub time_limit_ms: u32,
    /// Selection-only classification
    pub category: Category,
    pub screen: ScreenKind,
    pub difficulty: u8,
    pub requires_memory: bool,
    pub requires_previous: bool,
    pub requires_device: bool,
}

/// A static pool entry the generator stamps levels from
#[derive(Debug, Clone, Copy)]
pub struct LevelTemplate {
    pub rule: RuleId,
    pub category: Category,
    pub screen: ScreenKind,
    pub difficulty: u8,
    /// Overrides the tier base time when set
    pub time_override_ms: Option<u32>,
    pub requires_memory: bool,
    pub requires_previous: bool,
    pub requires_device: bool,
}

/// Selection flags a template can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Needs {
    Nothing,
    /// Needs a remembered value in memory
    Memory,
    /// Needs a previous-level outcome in memory
    Previous,
    /// Needs device sensors (rotation / multi-touch)
    Device,
}

const fn template(
    rule: RuleId,
    category: Category,
    screen: ScreenKind,
    difficulty: u8,
    needs: Needs,
) -> LevelTemplate {
    LevelTemplate {
        rule,
        category,
        screen,
        difficulty,
        time_override_ms: None,
        requires_memory: matches!(needs, Needs::Memory),
        requires_previous: matches!(needs, Needs::Previous),
        requires_device: matches!(needs, Needs::Device),
    }
}

/// The full template pool, ordered roughly by difficulty
pub const TEMPLATES: &[LevelTemplate] = &[
    template(RuleId::TapOnce, Category::Tap, ScreenKind::Tap, 1, Needs::Nothing),
    template(RuleId::DontTap, Category::Inhibition, ScreenKind::Tap, 1, Needs::Nothing),
    template(RuleId::DoubleTap, Category::Tap, ScreenKind::Tap, 1, Needs::Nothing),
    template(RuleId::TapNTimes, Category::Tap, ScreenKind::Tap, 2, Needs::Nothing),
    template(RuleId::Hold, Category::Tap, ScreenKind::Hold, 2, Needs::Nothing),
    template(RuleId::Opposite, Category::Trick, ScreenKind::Tap, 2, Needs::Nothing),
    template(RuleId::FakeCrash, Category::Trick, ScreenKind::Crash, 3, Needs::Nothing),
    template(RuleId::RepeatPrevious, Category::Trick, ScreenKind::Tap, 3, Needs::Previous),
    template(RuleId::RememberNumber, Category::Memory, ScreenKind::Memory, 2, Needs::Nothing),
    template(RuleId::RememberIcon, Category::Memory, ScreenKind::Memory, 2, Needs::Nothing),
    template(RuleId::RecallNumber, Category::Memory, ScreenKind::Memory, 3, Needs::Memory),
    template(RuleId::RecallIcon, Category::Memory, ScreenKind::Memory, 3, Needs::Memory),
    template(RuleId::MathTap, Category::Math, ScreenKind::Math, 3, Needs::Nothing),
    template(RuleId::Stroop, Category::Trick, ScreenKind::Stroop, 4, Needs::Nothing),
    template(RuleId::Rotate, Category::Device, ScreenKind::Device, 4, Needs::Device),
    template(RuleId::MultiTouch, Category::Device, ScreenKind::Device, 4, Needs::Device),
];

/// A remember template must have been satisfiable before its recall twin is
/// offered.
fn memory_available(rule: RuleId, memory: &Memory) -> bool {
    match rule {
        RuleId::RecallNumber => memory.number.is_some(),
        RuleId::RecallIcon => memory.icon.is_some(),
        _ => true,
    }
}

/// Generate the next random level.
///
/// Filtering degrades gracefully: if anti-repeat empties the pool the
/// repeat constraints are relaxed, and an (unexpected) fully empty pool
/// falls back to the first template rather than failing the session.
pub fn generate_level(
    rng: &mut Pcg32,
    level_number: u32,
    history: &SessionHistory,
    memory: &Memory,
    perf: &PerfContext,
) -> Level {
    let config = difficulty_config(level_number);

    let eligible: Vec<&LevelTemplate> = TEMPLATES
        .iter()
        .filter(|t| config.allowed_categories.contains(&t.category))
        .filter(|t| t.difficulty <= config.max_difficulty)
        .filter(|t| memory_available(t.rule, memory))
        .filter(|t| !t.requires_previous || memory.previous_correct_action.is_some())
        .collect();

    // Rescue policy: a struggling player gets an easy template when any exist
    let eligible: Vec<&LevelTemplate> = if should_rescue(perf) {
        let easy: Vec<&LevelTemplate> =
            eligible.iter().copied().filter(|t| t.difficulty <= 1).collect();
        if easy.is_empty() { eligible } else { easy }
    } else {
        eligible
    };

    // Anti-repeat, relaxed stepwise if it empties the pool
    let fresh: Vec<&LevelTemplate> = eligible
        .iter()
        .copied()
        .filter(|t| !history.recent_rules.contains(&t.rule))
        .filter(|t| !history.recent_categories.contains(&t.category))
        .collect();
    let pool = if !fresh.is_empty() {
        fresh
    } else {
        let rule_only: Vec<&LevelTemplate> = eligible
            .iter()
            .copied()
            .filter(|t| !history.recent_rules.contains(&t.rule))
            .collect();
        if !rule_only.is_empty() { rule_only } else { eligible }
    };

    let tpl = if pool.is_empty() {
        log::warn!("template pool empty at level {level_number}, falling back");
        &TEMPLATES[0]
    } else {
        pool[rng.random_range(0..pool.len())]
    };

    resolve(rng, tpl, level_number, memory, perf)
}

/// Stamp a concrete level from a template: roll dynamic parameters, build
/// the instruction, and pass the time budget through the performance
/// adjustment.
pub fn resolve(
    rng: &mut Pcg32,
    tpl: &LevelTemplate,
    level_number: u32,
    memory: &Memory,
    perf: &PerfContext,
) -> Level {
    let (instruction, params) = resolve_params(rng, tpl.rule, memory);
    let base = tpl
        .time_override_ms
        .unwrap_or_else(|| difficulty_config(level_number).base_time_ms);

    Level {
        id: level_number,
        instruction,
        rule: tpl.rule,
        params,
        time_limit_ms: adjust_time_for_performance(base, perf),
        category: tpl.category,
        screen: tpl.screen,
        difficulty: tpl.difficulty,
        requires_memory: tpl.requires_memory,
        requires_previous: tpl.requires_previous,
        requires_device: tpl.requires_device,
    }
}

fn pick<T: Copy>(rng: &mut Pcg32, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

fn resolve_params(rng: &mut Pcg32, rule: RuleId, memory: &Memory) -> (String, RuleParams) {
    match rule {
        RuleId::TapOnce => ("Tap once".to_string(), RuleParams::None),
        RuleId::DoubleTap => ("Double tap!".to_string(), RuleParams::None),
        RuleId::DontTap => ("Don't tap!".to_string(), RuleParams::None),
        RuleId::TapNTimes => {
            let count = rng.random_range(3..=5u32);
            (format!("Tap {count} times"), RuleParams::TapNTimes { count })
        }
        RuleId::Opposite => {
            // The instruction lies; the count says what it claimed
            let count = rng.random_range(0..=1u32);
            let text = if count == 0 { "Don't tap!" } else { "Tap once" };
            (
                format!("OPPOSITE DAY: {text}"),
                RuleParams::Opposite { count },
            )
        }
        RuleId::RememberNumber => {
            let number = rng.random_range(2..=7u8);
            (
                format!("Remember: {number}"),
                RuleParams::RememberNumber { number },
            )
        }
        RuleId::RememberIcon => {
            let icon = pick(rng, &Icon::ALL);
            (
                format!("Remember: {}", icon.as_str()),
                RuleParams::RememberIcon { icon },
            )
        }
        RuleId::RecallNumber => (
            "Tap the number you remembered".to_string(),
            RuleParams::None,
        ),
        RuleId::RecallIcon => {
            // Half the time show the remembered icon, half a decoy
            let target_icon = if rng.random_bool(0.5) {
                memory.icon.unwrap_or_else(|| pick(rng, &Icon::ALL))
            } else {
                pick(rng, &Icon::ALL)
            };
            (
                format!("Did you see the {}? Tap if yes", target_icon.as_str()),
                RuleParams::RecallIcon { target_icon },
            )
        }
        RuleId::MathTap => {
            let a = rng.random_range(1..=4u32);
            let b = rng.random_range(1..=3u32);
            let answer = a + b;
            // Decoy is deliberately off by one or two
            let offset = rng.random_range(1..=2u32);
            let displayed = if rng.random_bool(0.5) {
                answer + offset
            } else {
                answer.saturating_sub(offset).max(1)
            };
            (
                format!("{a} + {b} = {displayed}. Tap the real answer!"),
                RuleParams::MathTap { answer, displayed },
            )
        }
        RuleId::RepeatPrevious => ("Do what you did last time".to_string(), RuleParams::None),
        RuleId::Stroop => {
            let word = pick(rng, &StroopColor::ALL);
            let ink = pick(rng, &StroopColor::ALL);
            let target = pick(rng, &StroopColor::ALL);
            // Resolved here so validation stays a plain boolean check
            let should_tap = ink == target;
            (
                format!(
                    "Tap if '{}' is written in {}",
                    word.as_str(),
                    target.as_str()
                ),
                RuleParams::Stroop {
                    word,
                    ink,
                    target,
                    should_tap,
                },
            )
        }
        RuleId::FakeCrash => (
            "ERR 0x5F3B: SYSTEM HALTED".to_string(),
            RuleParams::None,
        ),
        RuleId::Hold => {
            let min_ms = pick(rng, &[800u32, 1000, 1200, 1500]);
            (
                format!("Hold for {:.1}s", min_ms as f32 / 1000.0),
                RuleParams::Hold { min_ms },
            )
        }
        RuleId::Rotate => ("Rotate your phone!".to_string(), RuleParams::None),
        RuleId::MultiTouch => {
            let fingers = rng.random_range(2..=3u8);
            (
                format!("Touch with {fingers} fingers"),
                RuleParams::MultiTouch { fingers },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_early_levels_stay_in_easy_categories() {
        let mut rng = rng();
        let history = SessionHistory::default();
        let memory = Memory::default();
        let perf = PerfContext::default();
        for _ in 0..50 {
            let level = generate_level(&mut rng, 2, &history, &memory, &perf);
            assert!(matches!(level.category, Category::Tap | Category::Inhibition));
            assert!(level.difficulty <= 1);
        }
    }

    #[test]
    fn test_recall_requires_memory() {
        let mut rng = rng();
        let history = SessionHistory::default();
        let empty = Memory::default();
        let perf = PerfContext::default();
        // With nothing remembered, recall templates must never surface
        for _ in 0..100 {
            let level = generate_level(&mut rng, 25, &history, &empty, &perf);
            assert!(!matches!(level.rule, RuleId::RecallNumber | RuleId::RecallIcon));
        }
    }

    #[test]
    fn test_anti_repeat_avoids_recent_rules() {
        let mut rng = rng();
        let mut history = SessionHistory::default();
        history.record_generated(RuleId::TapOnce, Category::Tap);
        history.record_generated(RuleId::DontTap, Category::Inhibition);
        let memory = Memory::default();
        let perf = PerfContext::default();
        for _ in 0..50 {
            let level = generate_level(&mut rng, 3, &history, &memory, &perf);
            assert!(!history.recent_rules.contains(&level.rule));
        }
    }

    #[test]
    fn test_rescue_prefers_easy_templates() {
        let mut rng = rng();
        let history = SessionHistory::default();
        let memory = Memory::default();
        let perf = PerfContext {
            combo: 0,
            recent_errors: 3,
            chapter: None,
        };
        for _ in 0..50 {
            let level = generate_level(&mut rng, 35, &history, &memory, &perf);
            assert_eq!(level.difficulty, 1);
        }
    }

    #[test]
    fn test_params_variant_matches_rule() {
        let mut rng = rng();
        let history = SessionHistory::default();
        let memory = Memory::default().remembering_number(4).remembering_icon(Icon::Sun);
        let perf = PerfContext::default();
        for _ in 0..200 {
            let level = generate_level(&mut rng, 35, &history, &memory, &perf);
            let ok = match level.rule {
                RuleId::TapNTimes => matches!(level.params, RuleParams::TapNTimes { .. }),
                RuleId::Opposite => matches!(level.params, RuleParams::Opposite { .. }),
                RuleId::RememberNumber => {
                    matches!(level.params, RuleParams::RememberNumber { .. })
                }
                RuleId::RememberIcon => matches!(level.params, RuleParams::RememberIcon { .. }),
                RuleId::RecallIcon => matches!(level.params, RuleParams::RecallIcon { .. }),
                RuleId::MathTap => matches!(level.params, RuleParams::MathTap { .. }),
                RuleId::Stroop => matches!(level.params, RuleParams::Stroop { .. }),
                RuleId::Hold => matches!(level.params, RuleParams::Hold { .. }),
                RuleId::MultiTouch => matches!(level.params, RuleParams::MultiTouch { .. }),
                _ => matches!(level.params, RuleParams::None),
            };
            assert!(ok, "rule {:?} got params {:?}", level.rule, level.params);
        }
    }

    #[test]
    fn test_instruction_embeds_resolved_values() {
        let mut rng = rng();
        let memory = Memory::default();
        for _ in 0..50 {
            let (text, params) = resolve_params(&mut rng, RuleId::RememberNumber, &memory);
            let RuleParams::RememberNumber { number } = params else {
                panic!("wrong variant")
            };
            assert!((2..=7).contains(&number));
            assert_eq!(text, format!("Remember: {number}"));
        }
    }

    #[test]
    fn test_math_decoy_never_equals_answer() {
        let mut rng = rng();
        let memory = Memory::default();
        for _ in 0..200 {
            let (_, params) = resolve_params(&mut rng, RuleId::MathTap, &memory);
            let RuleParams::MathTap { answer, displayed } = params else {
                panic!("wrong variant")
            };
            assert_ne!(answer, displayed);
        }
    }
}

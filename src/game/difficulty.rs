//! Difficulty policy
//!
//! A step function over level-number tiers decides the per-level time budget,
//! which challenge categories are in play, and the maximum template
//! difficulty. A dynamic adjustment then nudges the time budget from recent
//! performance, scaled down in early chapters so new players are spared.

use serde::{Deserialize, Serialize};

use super::levels::Category;
use crate::consts::{DECAY_FLOOR_MS, MIN_LEVEL_TIME_MS};

/// Static configuration for one difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyConfig {
    /// Per-level time budget (ms) before performance adjustment
    pub base_time_ms: u32,
    /// Categories the generator may draw from
    pub allowed_categories: &'static [Category],
    /// Highest template difficulty the generator may pick
    pub max_difficulty: u8,
}

const TIER_1: &[Category] = &[Category::Tap, Category::Inhibition];
const TIER_2: &[Category] = &[Category::Tap, Category::Inhibition, Category::Trick];
const TIER_3: &[Category] = &[
    Category::Tap,
    Category::Inhibition,
    Category::Trick,
    Category::Memory,
];
const TIER_4: &[Category] = &[
    Category::Tap,
    Category::Inhibition,
    Category::Trick,
    Category::Memory,
    Category::Math,
];
const TIER_5: &[Category] = &[
    Category::Tap,
    Category::Inhibition,
    Category::Trick,
    Category::Memory,
    Category::Math,
    Category::Device,
];

/// Map a level number to its tier configuration.
///
/// Category sets only ever widen as the level number grows; the time budget
/// shrinks, decaying linearly past level 40 down to a floor.
pub fn difficulty_config(level: u32) -> DifficultyConfig {
    match level {
        0..=5 => DifficultyConfig {
            base_time_ms: 4000,
            allowed_categories: TIER_1,
            max_difficulty: 1,
        },
        6..=10 => DifficultyConfig {
            base_time_ms: 3500,
            allowed_categories: TIER_2,
            max_difficulty: 2,
        },
        11..=15 => DifficultyConfig {
            base_time_ms: 3200,
            allowed_categories: TIER_3,
            max_difficulty: 2,
        },
        16..=20 => DifficultyConfig {
            base_time_ms: 3000,
            allowed_categories: TIER_4,
            max_difficulty: 3,
        },
        21..=30 => DifficultyConfig {
            base_time_ms: 2600,
            allowed_categories: TIER_5,
            max_difficulty: 4,
        },
        31..=40 => DifficultyConfig {
            base_time_ms: 2200,
            allowed_categories: TIER_5,
            max_difficulty: 5,
        },
        _ => {
            let decayed = 2200u32.saturating_sub((level - 40) * 25);
            DifficultyConfig {
                base_time_ms: decayed.max(DECAY_FLOOR_MS),
                allowed_categories: TIER_5,
                max_difficulty: 5,
            }
        }
    }
}

/// Recent-performance snapshot consulted by the dynamic adjustment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerfContext {
    /// Current consecutive-success streak
    pub combo: u32,
    /// Failures among the last 5 levels
    pub recent_errors: u32,
    /// Active chapter id, if the session is in chapter mode
    pub chapter: Option<u32>,
}

/// How hard the dynamic adjustment bites: 0 for chapter 1, approaching 1 by
/// chapter 4, always 1 outside chapter mode.
fn intensity(chapter: Option<u32>) -> f64 {
    match chapter {
        None => 1.0,
        Some(id) => {
            let t = (id.saturating_sub(1)) as f64 / 3.0;
            t.powf(1.3).min(1.0)
        }
    }
}

/// Adjust a level's time budget from recent performance.
///
/// A hot streak trims time (40 ms per combo point, a further 80 ms per full
/// five-combo); a struggling player gets 300 ms of rescue time. The result is
/// clamped to `[1400, base + 500]`; the floor wins when a tiny base makes the
/// two cross.
pub fn adjust_time_for_performance(base_time_ms: u32, perf: &PerfContext) -> u32 {
    let mut adjustment = -40.0 * perf.combo as f64 - 80.0 * (perf.combo / 5) as f64;
    if perf.recent_errors >= 2 {
        adjustment += 300.0;
    }

    let adjusted = base_time_ms as f64 + adjustment * intensity(perf.chapter);
    let ceiling = ((base_time_ms + 500) as f64).max(MIN_LEVEL_TIME_MS as f64);
    adjusted.clamp(MIN_LEVEL_TIME_MS as f64, ceiling) as u32
}

/// True when the player has fumbled enough recently that the generator
/// should hand out an easy template.
pub fn should_rescue(perf: &PerfContext) -> bool {
    perf.recent_errors >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_categories_widen_across_tiers() {
        // Non-decreasing set size across every tier boundary
        let boundaries = [5u32, 10, 15, 20, 30, 40];
        for b in boundaries {
            let before = difficulty_config(b).allowed_categories.len();
            let after = difficulty_config(b + 1).allowed_categories.len();
            assert!(after >= before, "tier boundary {b} shrank the category set");
        }
    }

    #[test]
    fn test_base_time_decays_past_40_with_floor() {
        assert_eq!(difficulty_config(41).base_time_ms, 2175);
        assert_eq!(difficulty_config(50).base_time_ms, 1950);
        // Far past the decay range the floor holds
        assert_eq!(difficulty_config(200).base_time_ms, 1500);
    }

    #[test]
    fn test_intensity_by_chapter() {
        assert_eq!(intensity(Some(1)), 0.0);
        assert_eq!(intensity(None), 1.0);
        assert!(intensity(Some(2)) > 0.0 && intensity(Some(2)) < 1.0);
        assert_eq!(intensity(Some(4)), 1.0);
        assert_eq!(intensity(Some(9)), 1.0);
    }

    #[test]
    fn test_chapter_one_gets_no_adjustment() {
        let perf = PerfContext {
            combo: 10,
            recent_errors: 0,
            chapter: Some(1),
        };
        assert_eq!(adjust_time_for_performance(3000, &perf), 3000);
    }

    #[test]
    fn test_combo_trims_time_outside_chapters() {
        let perf = PerfContext {
            combo: 5,
            recent_errors: 0,
            chapter: None,
        };
        // -40*5 - 80*1 = -280
        assert_eq!(adjust_time_for_performance(3000, &perf), 2720);
    }

    #[test]
    fn test_rescue_adds_time() {
        let perf = PerfContext {
            combo: 0,
            recent_errors: 3,
            chapter: None,
        };
        assert_eq!(adjust_time_for_performance(3000, &perf), 3300);
        assert!(should_rescue(&perf));
        assert!(!should_rescue(&PerfContext::default()));
    }

    #[test]
    fn test_floor_wins_for_tiny_bases() {
        // base + 500 below the hard floor must not invert the clamp range
        let perf = PerfContext::default();
        assert_eq!(adjust_time_for_performance(800, &perf), 1400);
        assert_eq!(adjust_time_for_performance(0, &perf), 1400);
    }

    proptest! {
        #[test]
        fn prop_adjusted_time_within_bounds(
            base in 0u32..6000,
            combo in 0u32..60,
            recent_errors in 0u32..6,
            chapter in proptest::option::of(1u32..10),
        ) {
            let perf = PerfContext { combo, recent_errors, chapter };
            let adjusted = adjust_time_for_performance(base, &perf);
            prop_assert!(adjusted >= 1400);
            prop_assert!(adjusted <= (base + 500).max(1400));
        }
    }
}

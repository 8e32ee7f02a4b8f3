//! QA-only level generation
//!
//! Dev mode requests levels by category (optionally narrowed to a screen
//! type) and skips difficulty gating entirely. Recall templates are made
//! playable by seeding stand-in memory values.

use rand::Rng;
use rand_pcg::Pcg32;

use super::difficulty::PerfContext;
use super::levels::{Category, Icon, Level, LevelTemplate, ScreenKind, TEMPLATES, resolve};
use super::state::Memory;

/// Templates matching a category and, when given, a screen type.
pub fn matching_templates(
    category: Category,
    screen: Option<ScreenKind>,
) -> Vec<&'static LevelTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| t.category == category)
        .filter(|t| screen.is_none_or(|s| t.screen == s))
        .collect()
}

/// Memory pre-seeded so recall screens are testable in isolation.
fn seeded_memory() -> Memory {
    Memory::default()
        .remembering_number(4)
        .remembering_icon(Icon::Star)
}

/// Pick a random template for the pair and stamp a level from it.
/// Returns `None` when nothing matches (e.g. a screen type the category
/// never uses).
pub fn test_level(
    rng: &mut Pcg32,
    category: Category,
    screen: Option<ScreenKind>,
) -> Option<Level> {
    let pool = matching_templates(category, screen);
    if pool.is_empty() {
        log::warn!("no templates for {:?}/{:?}", category, screen);
        return None;
    }
    let tpl = pool[rng.random_range(0..pool.len())];
    Some(resolve(rng, tpl, 1, &seeded_memory(), &PerfContext::default()))
}

/// Stamp the index-th matching template (wrapping), for stepping through a
/// category's screens one by one.
pub fn test_level_indexed(
    rng: &mut Pcg32,
    category: Category,
    screen: Option<ScreenKind>,
    index: usize,
) -> Option<Level> {
    let pool = matching_templates(category, screen);
    if pool.is_empty() {
        return None;
    }
    let tpl = pool[index % pool.len()];
    Some(resolve(rng, tpl, 1, &seeded_memory(), &PerfContext::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::RuleId;
    use rand::SeedableRng;

    #[test]
    fn test_bypasses_difficulty_gating() {
        let mut rng = Pcg32::seed_from_u64(7);
        // Device templates are gated behind level 21+ in normal play
        let level = test_level(&mut rng, Category::Device, None).unwrap();
        assert!(matches!(level.rule, RuleId::Rotate | RuleId::MultiTouch));
    }

    #[test]
    fn test_screen_filter() {
        let mut rng = Pcg32::seed_from_u64(7);
        let level = test_level(&mut rng, Category::Tap, Some(ScreenKind::Hold)).unwrap();
        assert_eq!(level.rule, RuleId::Hold);
        // Inhibition never renders on a hold screen
        assert!(test_level(&mut rng, Category::Inhibition, Some(ScreenKind::Hold)).is_none());
    }

    #[test]
    fn test_indexed_wraps() {
        let mut rng = Pcg32::seed_from_u64(7);
        let n = matching_templates(Category::Tap, None).len();
        let first = test_level_indexed(&mut rng, Category::Tap, None, 0).unwrap();
        let wrapped = test_level_indexed(&mut rng, Category::Tap, None, n).unwrap();
        assert_eq!(first.rule, wrapped.rule);
    }
}

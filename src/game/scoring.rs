//! Pure scoring functions
//!
//! Called exclusively on level completion; failures reset the combo through
//! the same function for symmetry.

use crate::consts::BASE_SCORE;

/// Points for completing a level: base + combo bonus + time bonus.
///
/// The time bonus scales linearly with the fraction of the countdown left,
/// topping out at 50 points for an instant clear.
pub fn calculate_score(combo: u32, time_remaining_ms: u32, time_limit_ms: u32) -> u64 {
    let combo_bonus = (BASE_SCORE as f64 * combo as f64 * 0.5).floor() as u64;
    let ratio = if time_limit_ms == 0 {
        0.0
    } else {
        time_remaining_ms as f64 / time_limit_ms as f64
    };
    let time_bonus = (ratio.clamp(0.0, 1.0) * 50.0).floor() as u64;
    BASE_SCORE + combo_bonus + time_bonus
}

/// Consecutive-success streak: +1 on a pass, back to 0 on a fail.
pub fn calculate_combo(current: u32, passed: bool) -> u32 {
    if passed { current + 1 } else { 0 }
}

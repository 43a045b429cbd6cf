//! Scoring: line-clear reward table, agent population multiplier, crush penalty.

use crate::agent::MAX_AGENTS;

/// Exponent of the crush penalty curve.
const PENALTY_EXPONENT: f64 = 4.2;
/// Scale of the crush penalty curve.
const PENALTY_SCALE: f64 = 20.0;

/// Base reward for clearing `lines` rows with a single lock.
pub fn base_line_reward(lines: u32) -> i64 {
    match lines {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        4 => 800,
        n => i64::from(n) * 200,
    }
}

/// 1x with no agents alive, 5x at the population cap.
pub fn population_multiplier(alive: usize) -> f64 {
    1.0 + (alive as f64 / MAX_AGENTS as f64) * 4.0
}

/// Reward actually added to the score: `floor(base * multiplier)`.
pub fn line_clear_reward(lines: u32, alive_before_clear: usize) -> i64 {
    let base = base_line_reward(lines) as f64;
    (base * population_multiplier(alive_before_clear)).floor() as i64
}

/// Penalty for `kills` agents killed in one event: `floor(k^4.2 * 20)`.
pub fn crush_penalty(kills: u32) -> i64 {
    if kills == 0 {
        return 0;
    }
    (f64::from(kills).powf(PENALTY_EXPONENT) * PENALTY_SCALE).floor() as i64
}

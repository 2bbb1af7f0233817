//! Opponent and match weighting

use super::distribution::squash;
use crate::config::RatingConfig;

/// Influence of an opponent with `match_count` rated matches behind them.
///
/// Ramps linearly from `noob_weight` at zero matches to full weight once the
/// opponent reaches `placement` matches.
pub fn newcomer_weight(match_count: u32, placement: u32, noob_weight: f64) -> f64 {
    if match_count >= placement {
        1.0
    } else if match_count == 0 {
        noob_weight
    } else {
        f64::from(match_count) * (1.0 - noob_weight) / f64::from(placement) + noob_weight
    }
}

/// Weight grows with the number of stages in the match
pub fn stage_weight(stage_count: u32, factor: f64) -> f64 {
    saturating_weight(f64::from(stage_count), factor)
}

/// Weight grows with the number of competitors in the division
pub fn field_weight(competitor_count: usize, factor: f64) -> f64 {
    saturating_weight(competitor_count as f64, factor)
}

/// Mean of the stage and field weights; scales every rating change of a division
pub fn significance(stage_count: u32, competitor_count: usize, config: &RatingConfig) -> f64 {
    let stages = stage_weight(stage_count, config.stage_count_factor);
    let field = field_weight(competitor_count, config.competitor_count_factor);
    (stages + field) / 2.0
}

// 0.1 for a single unit, approaching 1.6 as the count grows
fn saturating_weight(count: f64, factor: f64) -> f64 {
    (squash(count - 1.0, 0.0, factor) - 0.5) * 3.0 + 0.1
}

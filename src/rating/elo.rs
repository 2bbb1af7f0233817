//! Classic multi-player Elo, kept as a reference model alongside Elo-MMR

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};

/// Default logistic scale used by the multi-player model
pub const DEFAULT_SCALE: f64 = 1000.0;

/// How raw match scores are turned into shares of the field total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreNormalization {
    /// Subtract the lowest score, then divide by the sum
    #[default]
    Floor,
    /// Fraction of the highest score
    Percent,
}

/// Probability that a player rated `ra` outscores one rated `rb`
pub fn expected_score(ra: f64, rb: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rb - ra) / scale))
}

/// Expected share of all pairwise outcomes for each player; sums to 1
pub fn expected_scores(ratings: &[f64], scale: f64) -> Vec<f64> {
    let pairs = pair_count(ratings.len()) / 2.0;
    pairwise_sum(ratings, |ra, rb| expected_score(ra, rb, scale) / pairs)
}

/// Normalise raw scores so they sum to 1 (floor) or peak at 1 (percent).
///
/// A zero denominator yields all zeros.
pub fn normalized_scores(scores: &[f64], method: ScoreNormalization) -> Vec<f64> {
    match method {
        ScoreNormalization::Floor => {
            let floor = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let shifted: Vec<f64> = scores.iter().map(|s| s - floor).collect();
            let total: f64 = shifted.iter().sum();
            if total == 0.0 {
                return vec![0.0; scores.len()];
            }
            shifted.iter().map(|s| s / total).collect()
        }
        ScoreNormalization::Percent => {
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max == 0.0 || !max.is_finite() {
                return vec![0.0; scores.len()];
            }
            scores.iter().map(|s| s / max).collect()
        }
    }
}

/// Adjust every rating by `K·(N−1)·(actual − expected)`, floor at `min_rating`, round.
pub fn rating_adjustment(
    ratings: &[f64],
    scores: &[f64],
    k: f64,
    scale: f64,
    min_rating: f64,
) -> Result<Vec<f64>> {
    if ratings.len() != scores.len() {
        return Err(RatingError::InvalidScore {
            reason: format!(
                "{} ratings but {} scores supplied to rating adjustment",
                ratings.len(),
                scores.len()
            ),
        }
        .into());
    }

    let n = ratings.len() as f64;
    let pairs = pair_count(ratings.len());
    let expected = pairwise_sum(ratings, |ra, rb| 2.0 * expected_score(ra, rb, scale) / pairs);
    let actual = normalized_scores(scores, ScoreNormalization::Floor);

    Ok(ratings
        .iter()
        .zip(expected.iter().zip(&actual))
        .map(|(ra, (ea, sa))| (ra + k * (n - 1.0) * (sa - ea)).max(min_rating).round())
        .collect())
}

/// K-factor schedule that shrinks with experience and bottoms out at 10
pub fn k_factor(match_count: u32, max_k: f64) -> f64 {
    if match_count > 10 {
        10.0
    } else {
        max_k / f64::from(match_count + 1)
    }
}

fn pair_count(n: usize) -> f64 {
    (n * n.saturating_sub(1)) as f64
}

fn pairwise_sum<F>(ratings: &[f64], term: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64,
{
    ratings
        .iter()
        .enumerate()
        .map(|(i, &ra)| {
            ratings
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, &rb)| term(ra, rb))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_expected_score_symmetry() {
        let a = expected_score(1200.0, 1000.0, 400.0);
        let b = expected_score(1000.0, 1200.0, 400.0);
        assert_abs_diff_eq!(a + b, 1.0, epsilon = 1e-12);
        assert!(a > 0.5);
        assert_abs_diff_eq!(expected_score(1000.0, 1000.0, 400.0), 0.5);
    }

    #[test]
    fn test_expected_scores_sum_to_one() {
        let expected = expected_scores(&[1000.0, 1000.0, 1000.0, 1000.0, 500.0], DEFAULT_SCALE);
        assert_abs_diff_eq!(expected.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(expected[4] < expected[0]);
    }

    #[test]
    fn test_normalized_scores() {
        let floor = normalized_scores(&[100.0, 75.0, 50.0], ScoreNormalization::Floor);
        assert_abs_diff_eq!(floor[0], 50.0 / 75.0, epsilon = 1e-12);
        assert_abs_diff_eq!(floor[2], 0.0);

        let percent = normalized_scores(&[100.0, 75.0, 50.0], ScoreNormalization::Percent);
        assert_eq!(percent, vec![1.0, 0.75, 0.5]);

        assert_eq!(normalized_scores(&[60.0, 60.0], ScoreNormalization::Floor), vec![0.0, 0.0]);
        assert_eq!(normalized_scores(&[0.0, 0.0], ScoreNormalization::Percent), vec![0.0, 0.0]);
    }

    #[test]
    fn test_rating_adjustment_is_zero_sum_for_equal_field() {
        let ratings = [1000.0, 1000.0, 1000.0, 1000.0];
        let scores = [100.0, 80.0, 60.0, 40.0];
        let adjusted = rating_adjustment(&ratings, &scores, 20.0, DEFAULT_SCALE, 100.0).unwrap();

        // expected share 0.25 each; floor-normalised actual 0.5, 1/3, 1/6, 0
        assert_eq!(adjusted, vec![1015.0, 1005.0, 995.0, 985.0]);
        assert_abs_diff_eq!(adjusted.iter().sum::<f64>(), 4000.0);
    }

    #[test]
    fn test_rating_adjustment_floor_and_errors() {
        let adjusted = rating_adjustment(&[150.0, 150.0], &[0.0, 100.0], 300.0, 400.0, 100.0).unwrap();
        assert_eq!(adjusted, vec![100.0, 300.0]);

        assert!(rating_adjustment(&[1000.0], &[1.0, 2.0], 20.0, 400.0, 100.0).is_err());
    }

    #[test]
    fn test_k_factor_schedule() {
        assert_eq!(k_factor(0, 300.0), 300.0);
        assert_eq!(k_factor(2, 300.0), 100.0);
        assert_eq!(k_factor(11, 300.0), 10.0);
    }
}

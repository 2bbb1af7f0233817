//! Discrete rating domain shared by every curve in one computation

use crate::config::RatingConfig;

/// Ordered integer sample points spanning `[rating_min, rating_max]`
#[derive(Debug, Clone, PartialEq)]
pub struct RatingGrid {
    points: Vec<f64>,
}

impl RatingGrid {
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            points: (min..=max).map(f64::from).collect(),
        }
    }

    pub fn from_config(config: &RatingConfig) -> Self {
        Self::new(config.rating_min, config.rating_max)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate `f` at every grid point
    pub fn evaluate<F>(&self, f: F) -> Vec<f64>
    where
        F: Fn(f64) -> f64,
    {
        self.points.iter().map(|&x| f(x)).collect()
    }

    /// Grid point where `|values|` is smallest; ties resolve to the lowest point
    pub fn argmin_abs(&self, values: &[f64]) -> Option<f64> {
        self.select(values, |candidate, best| candidate.abs() < best.abs())
    }

    /// Grid point where `values` is largest; ties resolve to the lowest point
    pub fn argmax(&self, values: &[f64]) -> Option<f64> {
        self.select(values, |candidate, best| candidate > best)
    }

    fn select<P>(&self, values: &[f64], better: P) -> Option<f64>
    where
        P: Fn(f64, f64) -> bool,
    {
        let mut best: Option<(f64, f64)> = None;
        for (&x, &value) in self.points.iter().zip(values) {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, best_value)) if !better(value, best_value) => {}
                _ => best = Some((x, value)),
            }
        }
        best.map(|(x, _)| x)
    }
}

//! Probability kernels and the one-sided contest outcome curves
//!
//! Every function takes a rating `x`, the centre `mean` of an opponent (or
//! competitor) belief and its `scale`, and is evaluated point-wise over a
//! [`RatingGrid`](super::grid::RatingGrid). The win and loss curves are the
//! non-negative likelihoods that a competitor of skill `x` finished ahead of,
//! respectively behind, someone centred at `mean`.

use crate::types::Kernel;
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// Scales below one grid step are treated as one grid step
pub const MIN_SCALE: f64 = 1.0;

/// Width, in rating points, of the secant used to extend the curved core
const TAIL_STEP: f64 = 10.0;

/// Number of scales from the mean where the linear tail takes over
const TAIL_START: f64 = 2.0;

fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.max(MIN_SCALE)
    } else {
        MIN_SCALE
    }
}

/// Logistic scale parameter matching a standard deviation of `scale`
fn logistic_width(scale: f64) -> f64 {
    3f64.sqrt() / PI * scale
}

/// Probability density
pub fn density(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let scale = effective_scale(scale);
    match kernel {
        Kernel::Normal => {
            let z = (x - mean) / scale;
            (-0.5 * z * z).exp() / (scale * (2.0 * PI).sqrt())
        }
        Kernel::Logistic => {
            let d = logistic_width(scale);
            let cosh = ((x - mean) / (2.0 * d)).cosh();
            1.0 / (4.0 * d * cosh * cosh)
        }
    }
}

/// Natural log of [`density`], finite far into the tails
pub fn log_density(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let scale = effective_scale(scale);
    match kernel {
        Kernel::Normal => {
            let z = (x - mean) / scale;
            -0.5 * z * z - (scale * (2.0 * PI).sqrt()).ln()
        }
        Kernel::Logistic => {
            let d = logistic_width(scale);
            let u = ((x - mean) / (2.0 * d)).abs();
            // ln cosh(u) = u + ln(1 + e^-2u) - ln 2
            let ln_cosh = u + (-2.0 * u).exp().ln_1p() - 2f64.ln();
            -2.0 * ln_cosh - (4.0 * d).ln()
        }
    }
}

/// First derivative of [`density`] with respect to `x`
pub fn density_derivative(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let s = effective_scale(scale);
    match kernel {
        Kernel::Normal => -(x - mean) * density(x, mean, s, kernel) / (s * s),
        Kernel::Logistic => {
            let d = logistic_width(s);
            density(x, mean, s, kernel) * (1.0 - 2.0 * cdf(x, mean, s, kernel)) / d
        }
    }
}

/// Cumulative distribution, `P(X <= x)`
pub fn cdf(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let scale = effective_scale(scale);
    match kernel {
        Kernel::Normal => 0.5 * erfc(-(x - mean) / (scale * SQRT_2)),
        Kernel::Logistic => {
            let d = logistic_width(scale);
            0.5 * (1.0 + ((x - mean) / (2.0 * d)).tanh())
        }
    }
}

/// Upper tail mass, `P(X > x)`, taken by reflecting about the mean
pub fn upper_tail(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    cdf(2.0 * mean - x, mean, scale, kernel)
}

/// Ratio of the density slope to the density; the "draw" signal
pub fn draw_distribution(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let pdf = density(x, mean, scale, kernel);
    if pdf == 0.0 {
        return 0.0;
    }
    density_derivative(x, mean, scale, kernel) / pdf
}

/// Bounded logistic map onto (0, 1)
pub fn squash(x: f64, center: f64, scale: f64) -> f64 {
    1.0 / (1.0 + (-scale * (x - center)).exp())
}

/// Likelihood that a competitor rated `x` finished ahead of someone centred at `mean`.
///
/// The curved core is `density / cdf`. Below `mean - 2·scale` the cdf goes to
/// zero and the ratio diverges, so the curve continues linearly with the
/// secant slope measured just inside the core.
pub fn win_distribution(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let scale = effective_scale(scale);
    let core = |v: f64| density(v, mean, scale, kernel) / cdf(v, mean, scale, kernel);
    let edge = mean - TAIL_START * scale;

    if x >= edge {
        return core(x);
    }

    let y_edge = core(edge);
    let slope = (core(edge + TAIL_STEP) - y_edge) / TAIL_STEP;
    y_edge + slope * (x - edge)
}

/// Likelihood that a competitor rated `x` finished behind someone centred at `mean`.
///
/// Mirror of [`win_distribution`]: `density / upper_tail`, linear above
/// `mean + 2·scale`.
pub fn loss_distribution(x: f64, mean: f64, scale: f64, kernel: Kernel) -> f64 {
    let scale = effective_scale(scale);
    let core = |v: f64| density(v, mean, scale, kernel) / upper_tail(v, mean, scale, kernel);
    let edge = mean + TAIL_START * scale;

    if x <= edge {
        return core(x);
    }

    let y_edge = core(edge);
    let slope = (y_edge - core(edge - TAIL_STEP)) / TAIL_STEP;
    y_edge + slope * (x - edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::grid::RatingGrid;
    use approx::assert_abs_diff_eq;

    const KERNELS: [Kernel; 2] = [Kernel::Normal, Kernel::Logistic];

    #[test]
    fn test_density_integrates_to_one() {
        let grid = RatingGrid::new(-4000, 6000);
        for kernel in KERNELS {
            let mass: f64 = grid.evaluate(|x| density(x, 1000.0, 350.0, kernel)).iter().sum();
            assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_normal_density_peak() {
        let peak = density(1000.0, 1000.0, 350.0, Kernel::Normal);
        assert_abs_diff_eq!(peak, 1.0 / (350.0 * (2.0 * PI).sqrt()), epsilon = 1e-12);
    }

    #[test]
    fn test_log_density_matches_density() {
        for kernel in KERNELS {
            for x in [100.0, 750.0, 1000.0, 1900.0] {
                let direct = density(x, 1000.0, 350.0, kernel).ln();
                assert_abs_diff_eq!(log_density(x, 1000.0, 350.0, kernel), direct, epsilon = 1e-9);
            }
        }
        // Far tail stays finite where the plain density underflows
        assert!(log_density(30000.0, 0.0, 10.0, Kernel::Logistic).is_finite());
        assert!(log_density(30000.0, 0.0, 10.0, Kernel::Normal).is_finite());
    }

    #[test]
    fn test_cdf_symmetry() {
        for kernel in KERNELS {
            assert_abs_diff_eq!(cdf(1000.0, 1000.0, 350.0, kernel), 0.5, epsilon = 1e-12);
            let lower = cdf(800.0, 1000.0, 350.0, kernel);
            let upper = upper_tail(1200.0, 1000.0, 350.0, kernel);
            assert_abs_diff_eq!(lower, upper, epsilon = 1e-12);
            assert_abs_diff_eq!(
                cdf(1200.0, 1000.0, 350.0, kernel) + upper_tail(1200.0, 1000.0, 350.0, kernel),
                1.0,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        for kernel in KERNELS {
            for x in [400.0, 900.0, 1000.0, 1450.0] {
                let h = 1e-3;
                let numeric = (density(x + h, 1000.0, 350.0, kernel)
                    - density(x - h, 1000.0, 350.0, kernel))
                    / (2.0 * h);
                assert_abs_diff_eq!(
                    density_derivative(x, 1000.0, 350.0, kernel),
                    numeric,
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn test_normal_draw_distribution() {
        let value = draw_distribution(1350.0, 1000.0, 350.0, Kernel::Normal);
        assert_abs_diff_eq!(value, -350.0 / (350.0 * 350.0), epsilon = 1e-12);
    }

    #[test]
    fn test_squash() {
        assert_abs_diff_eq!(squash(0.0, 0.0, 0.05), 0.5);
        assert!(squash(50.0, 0.0, 0.05) > 0.9);
        assert!(squash(-50.0, 0.0, 0.05) < 0.1);
        assert_abs_diff_eq!(squash(7.0, 7.0, 3.0), 0.5);
    }

    #[test]
    fn test_outcome_curves_non_negative_and_monotonic() {
        let grid = RatingGrid::new(100, 3000);
        for kernel in KERNELS {
            for (mean, scale) in [(1000.0, 350.0), (2500.0, 80.0), (150.0, 40.0), (1800.0, 5.0)] {
                let wins = grid.evaluate(|x| win_distribution(x, mean, scale, kernel));
                let losses = grid.evaluate(|x| loss_distribution(x, mean, scale, kernel));

                assert!(wins.iter().all(|w| w.is_finite() && *w >= 0.0));
                assert!(losses.iter().all(|l| l.is_finite() && *l >= 0.0));
                assert!(wins.windows(2).all(|w| w[1] <= w[0] + 1e-12));
                assert!(losses.windows(2).all(|l| l[1] + 1e-12 >= l[0]));
            }
        }
    }

    #[test]
    fn test_linear_tail_is_continuous() {
        for kernel in KERNELS {
            let edge = 1000.0 - 2.0 * 350.0;
            let inside = win_distribution(edge, 1000.0, 350.0, kernel);
            let outside = win_distribution(edge - 1e-6, 1000.0, 350.0, kernel);
            assert_abs_diff_eq!(inside, outside, epsilon = 1e-9);

            let edge = 1000.0 + 2.0 * 350.0;
            let inside = loss_distribution(edge, 1000.0, 350.0, kernel);
            let outside = loss_distribution(edge + 1e-6, 1000.0, 350.0, kernel);
            assert_abs_diff_eq!(inside, outside, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_scale_is_floored() {
        let value = density(1000.0, 1000.0, 0.0, Kernel::Normal);
        assert!(value.is_finite());
        assert!(win_distribution(500.0, 1000.0, 0.0, Kernel::Normal).is_finite());
    }
}

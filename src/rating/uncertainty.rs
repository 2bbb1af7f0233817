//! Field uncertainty helpers

use crate::types::Competitor;

/// Root mean square of the field's uncertainties; 0 for an empty field
pub fn match_uncertainty(field: &[Competitor]) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = field.iter().map(|c| c.uncertainty * c.uncertainty).sum();
    (sum_sq / field.len() as f64).sqrt()
}

/// Shrink a competitor's uncertainty toward the match uncertainty
pub fn blend_uncertainty(uncertainty: f64, match_uncertainty: f64) -> f64 {
    0.5 * (uncertainty * uncertainty + match_uncertainty * match_uncertainty).sqrt()
}

/// Apply [`blend_uncertainty`] across a field. Not part of the default update path.
pub fn blend_field_uncertainty(mut field: Vec<Competitor>, match_uncertainty: f64) -> Vec<Competitor> {
    for competitor in field.iter_mut() {
        competitor.uncertainty = blend_uncertainty(competitor.uncertainty, match_uncertainty);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn with_uncertainty(values: &[f64]) -> Vec<Competitor> {
        values
            .iter()
            .map(|&u| {
                let mut c = Competitor::new(None, "Open", 1, 100.0, 1);
                c.uncertainty = u;
                c
            })
            .collect()
    }

    #[test]
    fn test_match_uncertainty_rms() {
        assert_abs_diff_eq!(match_uncertainty(&with_uncertainty(&[350.0; 5])), 350.0);
        assert_abs_diff_eq!(
            match_uncertainty(&with_uncertainty(&[300.0, 400.0])),
            (125_000.0f64).sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_empty_field_has_zero_uncertainty() {
        assert_eq!(match_uncertainty(&[]), 0.0);
    }

    #[test]
    fn test_blend() {
        assert_abs_diff_eq!(blend_uncertainty(300.0, 400.0), 250.0);
        let blended = blend_field_uncertainty(with_uncertainty(&[300.0, 0.0]), 400.0);
        assert_abs_diff_eq!(blended[0].uncertainty, 250.0);
        assert_abs_diff_eq!(blended[1].uncertainty, 200.0);
    }
}

use classification_core::{
    ClassifierError, ClassifierResult, PredictiveField, ProbabilityField, QueryGrid, ScalarGrid,
};
use statrs::distribution::{ContinuousCDF, Normal};

/// Standardized margin z = -m / σ, so that P[value ≤ 0] = Φ(z).
///
/// With zero variance the limit as σ → 0⁺ is taken: +∞ for negative means,
/// -∞ for positive means and 0 for a zero mean.
pub fn standardized_margin(mean: f64, variance: f64) -> f64 {
    debug_assert!(variance >= 0.0, "variance must be non-negative");
    if variance == 0.0 {
        if mean > 0.0 {
            f64::NEG_INFINITY
        } else if mean < 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        -mean / variance.sqrt()
    }
}

/// Maps Gaussian predictions to the probability that the true value is ≤ 0.
#[derive(Debug, Clone)]
pub struct ProbabilityTransform {
    standard_normal: Normal,
}

impl ProbabilityTransform {
    pub fn new() -> ClassifierResult<Self> {
        let standard_normal =
            Normal::new(0.0, 1.0).map_err(|e| ClassifierError::Calculation(e.to_string()))?;
        Ok(Self { standard_normal })
    }

    /// Φ(-m / sqrt(v)), with the zero-variance limit applied explicitly:
    /// 0 for m > 0, 1 for m < 0 and 0.5 for m = 0.
    /// Margins beyond about ±8 saturate to exactly 0 or 1 in f64.
    pub fn probability_non_positive(&self, mean: f64, variance: f64) -> f64 {
        if variance == 0.0 {
            return if mean > 0.0 {
                0.0
            } else if mean < 0.0 {
                1.0
            } else {
                0.5
            };
        }
        self.standard_normal
            .cdf(standardized_margin(mean, variance))
    }

    /// Φ⁻¹(p): the standardized margin at which the probability equals `p`.
    pub fn quantile(&self, p: f64) -> f64 {
        self.standard_normal.inverse_cdf(p)
    }

    /// Cell-wise probability grid
    pub fn transform(&self, field: &PredictiveField) -> ClassifierResult<ScalarGrid> {
        field
            .mean()
            .zip_map(field.variance(), |m, v| self.probability_non_positive(m, v))
    }

    /// Probability grid attached to the query geometry it was predicted on.
    pub fn probability_field(
        &self,
        grid: &QueryGrid,
        field: &PredictiveField,
    ) -> ClassifierResult<ProbabilityField> {
        ProbabilityField::new(*grid, self.transform(field)?)
    }

    /// Cell-wise standardized margin grid
    pub fn margin_field(&self, field: &PredictiveField) -> ClassifierResult<ScalarGrid> {
        field.mean().zip_map(field.variance(), standardized_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform() -> ProbabilityTransform {
        ProbabilityTransform::new().unwrap()
    }

    #[test]
    fn test_zero_variance_limits() {
        let t = transform();
        assert_eq!(t.probability_non_positive(2.0, 0.0), 0.0);
        assert_eq!(t.probability_non_positive(-2.0, 0.0), 1.0);
        assert_eq!(t.probability_non_positive(0.0, 0.0), 0.5);
        assert_eq!(t.probability_non_positive(-0.0, 0.0), 0.5);
        assert_eq!(t.probability_non_positive(1e-300, 0.0), 0.0);
    }

    #[test]
    fn test_known_values() {
        let t = transform();
        assert_relative_eq!(t.probability_non_positive(3.0, 1.0), 0.0013498980316301, epsilon = 1e-9);
        assert_relative_eq!(t.probability_non_positive(0.0, 4.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(t.probability_non_positive(-1.0, 1.0), 0.8413447460685429, epsilon = 1e-9);
    }

    #[test]
    fn test_open_interval_for_positive_variance() {
        let t = transform();
        // |z| ≤ 6 here; beyond roughly 8 the normal CDF rounds to 0 or 1
        for mean in [-3.0, -1.0, -0.1, 0.0, 0.1, 1.0, 3.0] {
            for variance in [0.25, 1.0, 25.0] {
                let p = t.probability_non_positive(mean, variance);
                assert!(p > 0.0 && p < 1.0, "p({mean}, {variance}) = {p}");
            }
        }
    }

    #[test]
    fn test_monotone_decreasing_in_mean() {
        let t = transform();
        let means: Vec<f64> = (-30..=30).map(|i| i as f64 * 0.1).collect();
        for variance in [0.25, 1.0, 9.0] {
            let probs: Vec<f64> = means
                .iter()
                .map(|&m| t.probability_non_positive(m, variance))
                .collect();
            assert!(probs.windows(2).all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn test_extreme_margins_saturate_inside_unit_interval() {
        let t = transform();
        assert_eq!(t.probability_non_positive(-5.0, 0.01), 1.0);
        assert_eq!(t.probability_non_positive(5.0, 0.01), 0.0);
        for mean in [-1e6, -50.0, 50.0, 1e6] {
            let p = t.probability_non_positive(mean, 1e-4);
            assert!((0.0..=1.0).contains(&p), "p({mean}) = {p}");
        }
    }

    #[test]
    fn test_symmetry() {
        let t = transform();
        for mean in [0.3, 1.0, 2.5, 4.0] {
            for variance in [0.5, 1.0, 3.0] {
                let p = t.probability_non_positive(mean, variance);
                let q = t.probability_non_positive(-mean, variance);
                assert_relative_eq!(p + q, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_margin_limits() {
        assert_eq!(standardized_margin(1.0, 0.0), f64::NEG_INFINITY);
        assert_eq!(standardized_margin(-1.0, 0.0), f64::INFINITY);
        assert_eq!(standardized_margin(0.0, 0.0), 0.0);
        assert_relative_eq!(standardized_margin(3.0, 4.0), -1.5);
    }

    #[test]
    fn test_quantile_inverts_probability() {
        let t = transform();
        assert_relative_eq!(t.quantile(0.975), 1.959963984540054, epsilon = 1e-9);
        assert_relative_eq!(t.quantile(0.5), 0.0, epsilon = 1e-12);
        let z = t.quantile(0.025);
        assert_relative_eq!(t.probability_non_positive(-z, 1.0), 0.025, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_transform() {
        let t = transform();
        let mean = ScalarGrid::new(2, 2, vec![3.0, 0.0, -2.0, 0.0]).unwrap();
        let variance = ScalarGrid::new(2, 2, vec![1.0, 4.0, 0.0, 0.0]).unwrap();
        let field = PredictiveField::new(mean, variance).unwrap();

        let p = t.transform(&field).unwrap();
        assert_relative_eq!(p[(0, 0)], 0.0013498980316301, epsilon = 1e-9);
        assert_eq!(p[(0, 1)], 0.5);
        assert_eq!(p[(1, 0)], 1.0);
        assert_eq!(p[(1, 1)], 0.5);
        assert!(p.values().iter().all(|v| !v.is_nan()));

        let z = t.margin_field(&field).unwrap();
        assert_relative_eq!(z[(0, 0)], -3.0);
        assert_eq!(z[(1, 0)], f64::INFINITY);
    }
}

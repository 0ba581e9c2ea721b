//! Confidence Contour Extractor
//!
//! Turns a probability field into the median decision boundary and the
//! lower/upper confidence boundaries for a chosen confidence level.

use classification_core::{
    BoundaryCurve, BoundaryKind, ClassifierResult, ConfidenceLevel, ProbabilityField, ScalarGrid,
};
use serde::{Deserialize, Serialize};

use crate::contour::trace_isolines;
use crate::transform::ProbabilityTransform;

/// Contour levels for the three boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryThresholds {
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

impl BoundaryThresholds {
    pub fn get(&self, kind: BoundaryKind) -> f64 {
        match kind {
            BoundaryKind::Lower => self.lower,
            BoundaryKind::Median => self.median,
            BoundaryKind::Upper => self.upper,
        }
    }
}

/// The three boundary curve sets of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBoundaries {
    pub lower: BoundaryCurve,
    pub median: BoundaryCurve,
    pub upper: BoundaryCurve,
}

/// How confidently a single cell is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellClass {
    /// P ≥ upper threshold
    ConfidentlyNonPositive,
    /// P ≤ lower threshold
    ConfidentlyPositive,
    /// Between the two confidence boundaries
    Uncertain,
}

/// Cells whose probability lies strictly between the lower and upper thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertainZone {
    rows: usize,
    cols: usize,
    mask: Vec<bool>,
}

impl UncertainZone {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.mask[row * self.cols + col]
    }

    pub fn cell_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Share of grid cells that are not confidently classified
    pub fn fraction(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.cell_count() as f64 / self.mask.len() as f64
    }

    /// Whether every uncertain cell of `self` is also uncertain in `other`.
    pub fn is_subset_of(&self, other: &UncertainZone) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.mask.iter().zip(&other.mask).all(|(&a, &b)| !a || b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceContourExtractor {
    confidence_level: ConfidenceLevel,
}

impl ConfidenceContourExtractor {
    pub fn new(confidence_level: ConfidenceLevel) -> Self {
        Self { confidence_level }
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    /// Probability thresholds: tail, 0.5 and 1 - tail.
    pub fn thresholds(&self) -> BoundaryThresholds {
        BoundaryThresholds {
            lower: self.confidence_level.lower_threshold(),
            median: 0.5,
            upper: self.confidence_level.upper_threshold(),
        }
    }

    /// The same boundaries expressed on the standardized margin -m/σ.
    ///
    /// Contouring the margin field at these levels is equivalent to
    /// contouring the probability field at [`Self::thresholds`], up to edge
    /// interpolation within one cell. Zero-variance cells (margin ±∞) are
    /// included.
    pub fn quantile_levels(&self, transform: &ProbabilityTransform) -> BoundaryThresholds {
        let t = self.thresholds();
        BoundaryThresholds {
            lower: transform.quantile(t.lower),
            median: transform.quantile(t.median),
            upper: transform.quantile(t.upper),
        }
    }

    pub fn classify(&self, probability: f64) -> CellClass {
        let t = self.thresholds();
        if probability >= t.upper {
            CellClass::ConfidentlyNonPositive
        } else if probability <= t.lower {
            CellClass::ConfidentlyPositive
        } else {
            CellClass::Uncertain
        }
    }

    pub fn extract(&self, field: &ProbabilityField) -> ClassifierResult<ConfidenceBoundaries> {
        let t = self.thresholds();
        Ok(ConfidenceBoundaries {
            lower: trace_boundary(field.values(), field, BoundaryKind::Lower, t.lower)?,
            median: trace_boundary(field.values(), field, BoundaryKind::Median, t.median)?,
            upper: trace_boundary(field.values(), field, BoundaryKind::Upper, t.upper)?,
        })
    }

    /// Boundaries traced on a margin grid at the normal quantiles of the
    /// thresholds. Levels are still reported as probabilities.
    pub fn extract_from_margin(
        &self,
        margin: &ScalarGrid,
        field: &ProbabilityField,
        transform: &ProbabilityTransform,
    ) -> ClassifierResult<ConfidenceBoundaries> {
        let t = self.thresholds();
        let q = self.quantile_levels(transform);
        let mut boundaries = ConfidenceBoundaries {
            lower: trace_boundary(margin, field, BoundaryKind::Lower, q.lower)?,
            median: trace_boundary(margin, field, BoundaryKind::Median, q.median)?,
            upper: trace_boundary(margin, field, BoundaryKind::Upper, q.upper)?,
        };
        boundaries.lower.level = t.lower;
        boundaries.median.level = t.median;
        boundaries.upper.level = t.upper;
        Ok(boundaries)
    }

    pub fn uncertain_zone(&self, field: &ProbabilityField) -> UncertainZone {
        let values = field.values();
        UncertainZone {
            rows: values.rows(),
            cols: values.cols(),
            mask: values
                .values()
                .iter()
                .map(|&p| self.classify(p) == CellClass::Uncertain)
                .collect(),
        }
    }
}

fn trace_boundary(
    values: &ScalarGrid,
    field: &ProbabilityField,
    kind: BoundaryKind,
    level: f64,
) -> ClassifierResult<BoundaryCurve> {
    let grid = field.grid();
    let polylines = trace_isolines(values, &grid.x_coords(), &grid.y_coords(), level)?;
    Ok(BoundaryCurve {
        kind,
        level,
        polylines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use classification_core::{Bounds, PredictiveField, QueryGrid};

    fn level(c: f64) -> ConfidenceLevel {
        ConfidenceLevel::new(c).unwrap()
    }

    /// Logistic field in x with its 0.5 crossing at x = 0
    fn sigmoid_field(n: usize) -> ProbabilityField {
        let grid = QueryGrid::square(Bounds::symmetric(5.0).unwrap(), n).unwrap();
        let values = grid.sample(|l| 1.0 / (1.0 + (1.7 * l.x).exp()));
        ProbabilityField::new(grid, values).unwrap()
    }

    #[test]
    fn test_threshold_derivation() {
        let t = ConfidenceContourExtractor::new(level(0.95)).thresholds();
        assert_relative_eq!(t.lower, 0.025, epsilon = 1e-12);
        assert_relative_eq!(t.median, 0.5);
        assert_relative_eq!(t.upper, 0.975, epsilon = 1e-12);

        let t = ConfidenceContourExtractor::new(level(0.5)).thresholds();
        assert_relative_eq!(t.lower, 0.25, epsilon = 1e-12);
        assert_relative_eq!(t.upper, 0.75, epsilon = 1e-12);
        assert_eq!(t.get(BoundaryKind::Upper), t.upper);
    }

    #[test]
    fn test_quantile_levels() {
        let transform = ProbabilityTransform::new().unwrap();
        let q = ConfidenceContourExtractor::new(level(0.95)).quantile_levels(&transform);
        assert_relative_eq!(q.lower, -1.959963984540054, epsilon = 1e-9);
        assert_relative_eq!(q.median, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.upper, 1.959963984540054, epsilon = 1e-9);
    }

    #[test]
    fn test_median_boundary_near_true_crossing() {
        let field = sigmoid_field(41);
        let cell = field.grid().cell_width();
        let boundaries = ConfidenceContourExtractor::default().extract(&field).unwrap();

        assert_eq!(boundaries.median.polylines.len(), 1);
        assert!(boundaries.median.point_count() >= 41);
        for p in boundaries.median.points() {
            assert!(p.x.abs() <= cell, "median point at x = {}", p.x);
        }
    }

    #[test]
    fn test_confidence_boundaries_straddle_median() {
        let field = sigmoid_field(41);
        let boundaries = ConfidenceContourExtractor::default().extract(&field).unwrap();

        // P decreases with x: the upper (0.975) boundary sits left of the median
        let upper_x = boundaries.upper.points().next().unwrap().x;
        let lower_x = boundaries.lower.points().next().unwrap().x;
        assert!(upper_x < 0.0 && lower_x > 0.0);
        // logit(0.975) / 1.7
        assert_relative_eq!(lower_x, 3.6635616461296463 / 1.7, epsilon = 0.1);
        assert_relative_eq!(upper_x, -3.6635616461296463 / 1.7, epsilon = 0.1);
    }

    #[test]
    fn test_confident_field_yields_empty_boundaries() {
        let grid = QueryGrid::square(Bounds::symmetric(1.0).unwrap(), 5).unwrap();
        let field = ProbabilityField::new(grid, grid.sample(|_| 0.999)).unwrap();
        let boundaries = ConfidenceContourExtractor::default().extract(&field).unwrap();

        assert!(boundaries.lower.is_empty());
        assert!(boundaries.median.is_empty());
        assert!(boundaries.upper.is_empty());
    }

    #[test]
    fn test_uncertain_zone_grows_with_confidence() {
        let field = sigmoid_field(51);
        let mut previous: Option<UncertainZone> = None;
        for c in [0.5, 0.8, 0.9, 0.95, 0.99] {
            let zone = ConfidenceContourExtractor::new(level(c)).uncertain_zone(&field);
            if let Some(prev) = &previous {
                assert!(prev.is_subset_of(&zone), "zone at {c} shrank");
                assert!(zone.fraction() >= prev.fraction());
            }
            previous = Some(zone);
        }
    }

    #[test]
    fn test_classify_cells() {
        let extractor = ConfidenceContourExtractor::default();
        assert_eq!(extractor.classify(0.99), CellClass::ConfidentlyNonPositive);
        assert_eq!(extractor.classify(0.975), CellClass::ConfidentlyNonPositive);
        assert_eq!(extractor.classify(0.01), CellClass::ConfidentlyPositive);
        assert_eq!(extractor.classify(0.5), CellClass::Uncertain);
    }

    fn assert_margin_matches_probability(grid: QueryGrid, predictive: PredictiveField) {
        let transform = ProbabilityTransform::new().unwrap();
        let field = transform.probability_field(&grid, &predictive).unwrap();
        let margin = transform.margin_field(&predictive).unwrap();
        let extractor = ConfidenceContourExtractor::default();

        let by_probability = extractor.extract(&field).unwrap();
        let by_margin = extractor
            .extract_from_margin(&margin, &field, &transform)
            .unwrap();

        let cell = grid.cell_width().max(grid.cell_height());
        for (a, b) in [
            (&by_probability.lower, &by_margin.lower),
            (&by_probability.median, &by_margin.median),
            (&by_probability.upper, &by_margin.upper),
        ] {
            assert_eq!(a.level, b.level);
            assert_eq!(a.polylines.len(), b.polylines.len());
            assert!(!a.is_empty());
            for p in a.points() {
                let nearest = b
                    .points()
                    .map(|q| p.distance(q))
                    .fold(f64::INFINITY, f64::min);
                assert!(nearest <= cell, "points differ by {nearest}");
            }
        }
    }

    #[test]
    fn test_margin_contours_match_probability_contours() {
        let grid = QueryGrid::square(Bounds::symmetric(4.0).unwrap(), 33).unwrap();
        let mean = grid.sample(|l| 2.0 - l.y - 0.4 * l.x * l.x);
        let variance = grid.sample(|l| 0.2 + 0.05 * (l.x * l.x + l.y * l.y));
        assert_margin_matches_probability(grid, PredictiveField::new(mean, variance).unwrap());
    }

    #[test]
    fn test_margin_contours_match_with_zero_variance() {
        let grid = QueryGrid::square(Bounds::symmetric(1.0).unwrap(), 5).unwrap();
        let mean = grid.sample(|l| l.x);
        let variance = grid.sample(|_| 0.0);
        assert_margin_matches_probability(grid, PredictiveField::new(mean, variance).unwrap());
    }
}

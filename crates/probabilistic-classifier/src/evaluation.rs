use classification_core::{
    BoundaryCurve, ClassifierResult, ConfidenceLevel, FittedRegressor, PredictiveField,
    ProbabilityField, QueryGrid, SampleSet, SpatialRegressor,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extractor::{ConfidenceContourExtractor, UncertainZone};
use crate::transform::ProbabilityTransform;

/// Output of one fit → predict → transform → extract pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub confidence_level: ConfidenceLevel,
    pub probability_field: ProbabilityField,
    pub median_boundary: BoundaryCurve,
    pub lower_boundary: BoundaryCurve,
    pub upper_boundary: BoundaryCurve,
    /// Raw regression output, kept only when diagnostics are requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictive_field: Option<PredictiveField>,
}

impl Evaluation {
    /// Lower, median and upper boundaries in that order
    pub fn boundaries(&self) -> [&BoundaryCurve; 3] {
        [&self.lower_boundary, &self.median_boundary, &self.upper_boundary]
    }

    pub fn uncertain_zone(&self) -> UncertainZone {
        ConfidenceContourExtractor::new(self.confidence_level).uncertain_zone(&self.probability_field)
    }
}

/// Regression model wrapped as a probabilistic classifier of sign(G(x) ≤ 0)
#[derive(Debug, Clone)]
pub struct ProbabilisticClassifier<R> {
    regressor: R,
    confidence_level: ConfidenceLevel,
    retain_predictive_field: bool,
}

impl<R: SpatialRegressor> ProbabilisticClassifier<R> {
    pub fn new(regressor: R, confidence_level: ConfidenceLevel) -> Self {
        Self {
            regressor,
            confidence_level,
            retain_predictive_field: false,
        }
    }

    /// Keep the mean/variance grids in the evaluation output.
    pub fn with_diagnostics(mut self, retain: bool) -> Self {
        self.retain_predictive_field = retain;
        self
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    pub fn evaluate(&self, samples: &SampleSet, grid: &QueryGrid) -> ClassifierResult<Evaluation> {
        run(
            &self.regressor,
            samples,
            grid,
            self.confidence_level,
            self.retain_predictive_field,
        )
    }
}

/// Fit `regressor`, predict on `grid` and derive the probability field and
/// its three boundaries. Any stage failing aborts the whole evaluation.
pub fn evaluate<R: SpatialRegressor>(
    regressor: &R,
    samples: &SampleSet,
    grid: &QueryGrid,
    confidence_level: ConfidenceLevel,
) -> ClassifierResult<Evaluation> {
    run(regressor, samples, grid, confidence_level, false)
}

fn run<R: SpatialRegressor>(
    regressor: &R,
    samples: &SampleSet,
    grid: &QueryGrid,
    confidence_level: ConfidenceLevel,
    retain_predictive_field: bool,
) -> ClassifierResult<Evaluation> {
    if !samples.has_both_classes() {
        warn!(
            samples = samples.len(),
            "sample set holds a single class; boundaries may be empty"
        );
    }

    let fitted = regressor.fit(samples)?;
    debug!(samples = samples.len(), "regression model fitted");

    let prediction = fitted.predict(&grid.locations())?;
    let predictive = PredictiveField::from_prediction(grid, prediction)?;
    debug!(rows = grid.rows(), cols = grid.cols(), "predictive field computed");

    let transform = ProbabilityTransform::new()?;
    let probability_field = transform.probability_field(grid, &predictive)?;

    let extractor = ConfidenceContourExtractor::new(confidence_level);
    let boundaries = extractor.extract(&probability_field)?;
    let zone = extractor.uncertain_zone(&probability_field);

    info!(
        confidence = confidence_level.value(),
        median_polylines = boundaries.median.polylines.len(),
        lower_polylines = boundaries.lower.polylines.len(),
        upper_polylines = boundaries.upper.polylines.len(),
        uncertain_fraction = zone.fraction(),
        "probabilistic classification evaluated"
    );

    Ok(Evaluation {
        confidence_level,
        probability_field,
        median_boundary: boundaries.median,
        lower_boundary: boundaries.lower,
        upper_boundary: boundaries.upper,
        predictive_field: retain_predictive_field.then_some(predictive),
    })
}

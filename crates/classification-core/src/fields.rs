use serde::{Deserialize, Serialize};

use crate::{ClassifierError, ClassifierResult, PredictiveSample, QueryGrid, ScalarGrid};

/// Co-indexed predictive mean and variance over a query grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveField {
    mean: ScalarGrid,
    variance: ScalarGrid,
}

impl PredictiveField {
    /// Variance may be exactly zero but never negative or infinite.
    pub fn new(mean: ScalarGrid, variance: ScalarGrid) -> ClassifierResult<Self> {
        if mean.shape() != variance.shape() {
            return Err(ClassifierError::InvalidInput(format!(
                "mean grid {:?} and variance grid {:?} differ in shape",
                mean.shape(),
                variance.shape()
            )));
        }
        if let Some(idx) = mean.values().iter().position(|m| m.is_nan()) {
            return Err(ClassifierError::InvalidInput(format!(
                "mean at cell {idx} is NaN"
            )));
        }
        if let Some((idx, v)) = variance
            .values()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ClassifierError::InvalidInput(format!(
                "variance at cell {idx} must be finite and non-negative, got {v}"
            )));
        }
        Ok(Self { mean, variance })
    }

    /// Reshape a flat regression output onto the grid it was predicted for.
    /// A length mismatch means the regression model broke its contract.
    pub fn from_prediction(grid: &QueryGrid, prediction: PredictiveSample) -> ClassifierResult<Self> {
        if prediction.mean.len() != grid.len() || prediction.variance.len() != grid.len() {
            return Err(ClassifierError::Prediction(format!(
                "expected {} predictions, got {} means and {} variances",
                grid.len(),
                prediction.mean.len(),
                prediction.variance.len()
            )));
        }
        let mean = ScalarGrid::new(grid.rows(), grid.cols(), prediction.mean)?;
        let variance = ScalarGrid::new(grid.rows(), grid.cols(), prediction.variance)?;
        Self::new(mean, variance)
    }

    pub fn mean(&self) -> &ScalarGrid {
        &self.mean
    }

    pub fn variance(&self) -> &ScalarGrid {
        &self.variance
    }

    pub fn std_dev(&self) -> ScalarGrid {
        self.variance.map(f64::sqrt)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.mean.shape()
    }
}

/// P(true value ≤ 0) at every query location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityField {
    grid: QueryGrid,
    values: ScalarGrid,
}

impl ProbabilityField {
    pub fn new(grid: QueryGrid, values: ScalarGrid) -> ClassifierResult<Self> {
        if values.shape() != grid.shape() {
            return Err(ClassifierError::InvalidInput(format!(
                "probability grid {:?} does not match query grid {:?}",
                values.shape(),
                grid.shape()
            )));
        }
        if let Some((idx, p)) = values
            .values()
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ClassifierError::InvalidInput(format!(
                "probability at cell {idx} outside [0, 1]: {p}"
            )));
        }
        Ok(Self { grid, values })
    }

    pub fn grid(&self) -> &QueryGrid {
        &self.grid
    }

    pub fn values(&self) -> &ScalarGrid {
        &self.values
    }

    pub fn probability_at(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row, col)
    }
}

use serde::{Deserialize, Serialize};

/// Deterministic trend part of the kriging model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegressionBasis {
    /// Ordinary kriging: unknown constant mean
    #[default]
    Constant,
    /// Universal kriging with a first-order polynomial trend
    Linear,
}

impl RegressionBasis {
    pub fn size(&self) -> usize {
        match self {
            RegressionBasis::Constant => 1,
            RegressionBasis::Linear => 3,
        }
    }

    /// Basis functions evaluated at a (standardised) point
    pub fn evaluate(&self, point: [f64; 2]) -> Vec<f64> {
        match self {
            RegressionBasis::Constant => vec![1.0],
            RegressionBasis::Linear => vec![1.0, point[0], point[1]],
        }
    }
}

/// Stationary correlation model with an isotropic length parameter θ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrelationKernel {
    /// exp(-θ Σ d²)
    #[default]
    SquaredExponential,
    /// exp(-θ Σ |d|)
    AbsoluteExponential,
}

impl CorrelationKernel {
    pub fn correlation(&self, theta: f64, a: [f64; 2], b: [f64; 2]) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        match self {
            CorrelationKernel::SquaredExponential => (-theta * (dx * dx + dy * dy)).exp(),
            CorrelationKernel::AbsoluteExponential => (-theta * (dx.abs() + dy.abs())).exp(),
        }
    }
}

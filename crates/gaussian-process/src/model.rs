use classification_core::{
    ClassifierError, ClassifierResult, FittedRegressor, Location, PredictiveSample, SampleSet,
    SpatialRegressor,
};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::kernels::{CorrelationKernel, RegressionBasis};

/// Smallest accepted reciprocal condition number of the regression factor
const MIN_RCOND: f64 = 1e-10;

/// Kriging model configuration. Hyper-parameters are fixed, never optimised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianProcess {
    pub regression: RegressionBasis,
    pub correlation: CorrelationKernel,
    /// Isotropic correlation parameter θ (> 0)
    pub theta: f64,
    /// Added to the correlation diagonal for numerical stability
    pub nugget: f64,
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self {
            regression: RegressionBasis::Constant,
            correlation: CorrelationKernel::SquaredExponential,
            theta: 0.5,
            nugget: 10.0 * f64::EPSILON,
        }
    }
}

impl GaussianProcess {
    pub fn new(theta: f64) -> ClassifierResult<Self> {
        let gp = Self {
            theta,
            ..Self::default()
        };
        gp.validate()?;
        Ok(gp)
    }

    pub fn with_regression(mut self, regression: RegressionBasis) -> Self {
        self.regression = regression;
        self
    }

    pub fn with_correlation(mut self, correlation: CorrelationKernel) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_nugget(mut self, nugget: f64) -> Self {
        self.nugget = nugget;
        self
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        if !self.theta.is_finite() || self.theta <= 0.0 {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "theta must be positive, got {}",
                self.theta
            )));
        }
        if !self.nugget.is_finite() || self.nugget < 0.0 {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "nugget must be non-negative, got {}",
                self.nugget
            )));
        }
        Ok(())
    }
}

/// Affine standardisation (population mean and standard deviation)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scale {
    mean: f64,
    std: f64,
}

impl Scale {
    fn fit(values: &[f64]) -> Self {
        let mean = values.mean();
        let std = values.population_std_dev();
        // Constant columns keep their units
        let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };
        Self { mean, std }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    fn restore(&self, value: f64) -> f64 {
        self.mean + self.std * value
    }
}

impl SpatialRegressor for GaussianProcess {
    type Fitted = FittedGaussianProcess;

    fn fit(&self, samples: &SampleSet) -> ClassifierResult<FittedGaussianProcess> {
        self.validate()?;

        let n = samples.len();
        let p = self.regression.size();
        if n < p {
            return Err(ClassifierError::Fitting(format!(
                "{n} samples cannot determine {p} regression coefficients"
            )));
        }

        let raw = samples.samples();
        for i in 0..n {
            for j in (i + 1)..n {
                if raw[i].location == raw[j].location {
                    return Err(ClassifierError::Fitting(format!(
                        "samples {i} and {j} share the location ({}, {})",
                        raw[i].location.x, raw[i].location.y
                    )));
                }
            }
        }

        let xs: Vec<f64> = raw.iter().map(|s| s.location.x).collect();
        let ys: Vec<f64> = raw.iter().map(|s| s.location.y).collect();
        let labels = samples.labels();
        let x_scale = Scale::fit(&xs);
        let y_scale = Scale::fit(&ys);
        let label_scale = Scale::fit(&labels);

        let points: Vec<[f64; 2]> = raw
            .iter()
            .map(|s| [x_scale.apply(s.location.x), y_scale.apply(s.location.y)])
            .collect();
        let targets = DVector::from_iterator(n, labels.iter().map(|&v| label_scale.apply(v)));

        let correlation = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0 + self.nugget
            } else {
                self.correlation.correlation(self.theta, points[i], points[j])
            }
        });
        let lower = correlation
            .cholesky()
            .ok_or_else(|| {
                ClassifierError::Fitting("correlation matrix is not positive definite".to_string())
            })?
            .l();

        let trend = DMatrix::from_row_iterator(
            n,
            p,
            points.iter().flat_map(|&pt| self.regression.evaluate(pt)),
        );
        let ft = lower
            .solve_lower_triangular(&trend)
            .ok_or_else(|| ClassifierError::Fitting("singular correlation factor".to_string()))?;

        let qr = ft.clone().qr();
        let q = qr.q();
        let g = qr.r();
        let singular = g.singular_values();
        let largest = singular.iter().copied().fold(0.0_f64, f64::max);
        let smallest = singular.iter().copied().fold(f64::INFINITY, f64::min);
        if largest <= 0.0 || smallest / largest < MIN_RCOND {
            return Err(ClassifierError::Fitting(
                "regression basis is ill conditioned for these samples".to_string(),
            ));
        }

        let yt = lower
            .solve_lower_triangular(&targets)
            .ok_or_else(|| ClassifierError::Fitting("singular correlation factor".to_string()))?;
        let beta = g
            .solve_upper_triangular(&(q.transpose() * &yt))
            .ok_or_else(|| ClassifierError::Fitting("singular regression factor".to_string()))?;
        let rho = &yt - &ft * &beta;
        let sigma2 = rho.norm_squared() / n as f64;
        let gamma = lower
            .transpose()
            .solve_upper_triangular(&rho)
            .ok_or_else(|| ClassifierError::Fitting("singular correlation factor".to_string()))?;

        debug!(
            samples = n,
            theta = self.theta,
            process_variance = sigma2 * label_scale.std.powi(2),
            "Gaussian process fitted"
        );

        Ok(FittedGaussianProcess {
            config: *self,
            points,
            x_scale,
            y_scale,
            label_scale,
            lower,
            ft,
            g,
            beta,
            gamma,
            sigma2,
        })
    }
}

/// A kriging model conditioned on a sample set
#[derive(Debug, Clone)]
pub struct FittedGaussianProcess {
    config: GaussianProcess,
    points: Vec<[f64; 2]>,
    x_scale: Scale,
    y_scale: Scale,
    label_scale: Scale,
    /// Cholesky factor C of the correlation matrix
    lower: DMatrix<f64>,
    /// C⁻¹F
    ft: DMatrix<f64>,
    /// Triangular factor of the thin QR of C⁻¹F
    g: DMatrix<f64>,
    beta: DVector<f64>,
    gamma: DVector<f64>,
    /// Process variance in standardised units
    sigma2: f64,
}

impl FittedGaussianProcess {
    pub fn config(&self) -> &GaussianProcess {
        &self.config
    }

    pub fn sample_count(&self) -> usize {
        self.points.len()
    }

    /// Process variance σ² in label units
    pub fn process_variance(&self) -> f64 {
        self.sigma2 * self.label_scale.std.powi(2)
    }

    /// Generalised least-squares trend coefficients (standardised units)
    pub fn regression_coefficients(&self) -> &[f64] {
        self.beta.as_slice()
    }

    fn standardize(&self, location: &Location) -> [f64; 2] {
        [self.x_scale.apply(location.x), self.y_scale.apply(location.y)]
    }

    fn predict_one(&self, location: &Location) -> ClassifierResult<(f64, f64)> {
        let point = self.standardize(location);
        let kernel = self.config.correlation;
        let theta = self.config.theta;

        let r = DVector::from_iterator(
            self.points.len(),
            self.points.iter().map(|&p| kernel.correlation(theta, point, p)),
        );
        let f = DVector::from_vec(self.config.regression.evaluate(point));

        let mean = f.dot(&self.beta) + r.dot(&self.gamma);

        let rt = self
            .lower
            .solve_lower_triangular(&r)
            .ok_or_else(|| ClassifierError::Prediction("singular correlation factor".to_string()))?;
        let u = self
            .g
            .transpose()
            .solve_lower_triangular(&(self.ft.transpose() * &rt - &f))
            .ok_or_else(|| ClassifierError::Prediction("singular regression factor".to_string()))?;
        let mse = self.sigma2 * (1.0 - rt.norm_squared() + u.norm_squared());

        Ok((
            self.label_scale.restore(mean),
            (mse * self.label_scale.std.powi(2)).max(0.0),
        ))
    }
}

impl FittedRegressor for FittedGaussianProcess {
    fn predict(&self, locations: &[Location]) -> ClassifierResult<PredictiveSample> {
        if locations.is_empty() {
            return Err(ClassifierError::Prediction(
                "no query locations given".to_string(),
            ));
        }
        if let Some(idx) = locations.iter().position(|l| !l.is_finite()) {
            return Err(ClassifierError::Prediction(format!(
                "query location {idx} is not finite"
            )));
        }

        let mut mean = Vec::with_capacity(locations.len());
        let mut variance = Vec::with_capacity(locations.len());
        for location in locations {
            let (m, v) = self.predict_one(location)?;
            mean.push(m);
            variance.push(v);
        }
        debug!(queries = locations.len(), "Gaussian process prediction complete");

        Ok(PredictiveSample { mean, variance })
    }
}

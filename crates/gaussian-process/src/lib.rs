//! Gaussian Process Regression Module
//!
//! Kriging interpolator with Gaussian predictive uncertainty. Provides the
//! mean and mean-squared-error surfaces that the probabilistic classifier
//! turns into P[G(x) ≤ 0].

pub mod kernels;
pub mod model;

pub use kernels::{CorrelationKernel, RegressionBasis};
pub use model::{FittedGaussianProcess, GaussianProcess};

use crate::{ClassifierResult, Location, PredictiveSample, SampleSet};

/// A regression model that can be fitted to a sample set.
///
/// Fitting consumes nothing and yields a separate fitted model, so a model
/// that was never trained cannot be asked for predictions.
pub trait SpatialRegressor {
    type Fitted: FittedRegressor;

    /// Fit the model. Degenerate sample sets are reported as
    /// [`ClassifierError::Fitting`](crate::ClassifierError::Fitting).
    fn fit(&self, samples: &SampleSet) -> ClassifierResult<Self::Fitted>;
}

/// A fitted regression model with Gaussian predictive uncertainty.
pub trait FittedRegressor {
    /// Predict mean and variance at each query location, in order.
    ///
    /// An empty query is a [`ClassifierError::Prediction`](crate::ClassifierError::Prediction).
    fn predict(&self, locations: &[Location]) -> ClassifierResult<PredictiveSample>;
}

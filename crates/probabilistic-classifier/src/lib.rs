//! Probabilistic Classification Module
//!
//! Converts a Gaussian regression surface into P[G(x) ≤ 0] over a 2-D grid
//! and extracts the median decision boundary together with its lower and
//! upper confidence boundaries.

pub mod contour;
pub mod evaluation;
pub mod extractor;
pub mod transform;


pub use contour::trace_isolines;
pub use evaluation::{evaluate, Evaluation, ProbabilisticClassifier};
pub use extractor::{
    BoundaryThresholds, CellClass, ConfidenceBoundaries, ConfidenceContourExtractor,
    UncertainZone,
};
pub use transform::{standardized_margin, ProbabilityTransform};

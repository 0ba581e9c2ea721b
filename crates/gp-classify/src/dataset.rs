//! Reference limit-state problem: classify where g(x) = b - x₂ - κ(x₁ - e)² is ≤ 0.

use classification_core::{ClassifierResult, Location, Polyline, QueryGrid, SampleSet};
use probabilistic_classifier::trace_isolines;

const B: f64 = 5.0;
const KAPPA: f64 = 0.5;
const E: f64 = 0.1;

/// Design of experiments
pub const DESIGN: [(f64, f64); 8] = [
    (-4.61611719, -6.00099547),
    (4.10469096, 5.32782448),
    (0.00000000, -0.50000000),
    (-6.17289014, -4.6984743),
    (1.3109306, -6.93271427),
    (-5.03823144, 3.10584743),
    (-2.87600388, 6.74310541),
    (5.21301203, 4.26386883),
];

pub fn limit_state(location: Location) -> f64 {
    B - location.y - KAPPA * (location.x - E).powi(2)
}

/// The design points labeled with the true limit-state values
pub fn reference_samples() -> ClassifierResult<SampleSet> {
    let locations: Vec<Location> = DESIGN.iter().copied().map(Location::from).collect();
    let labels = locations.iter().map(|&l| limit_state(l)).collect();
    SampleSet::new(locations, labels)
}

/// True zero level set of g traced on the query grid
pub fn reference_boundary(grid: &QueryGrid) -> ClassifierResult<Vec<Polyline>> {
    let values = grid.sample(limit_state);
    trace_isolines(&values, &grid.x_coords(), &grid.y_coords(), 0.0)
}

use serde::{Deserialize, Serialize};

use crate::{ClassifierError, ClassifierResult};

/// A point in the 2-D domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Location {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A labeled observation of the target function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub location: Location,
    pub label: f64,
}

impl Sample {
    pub fn new(location: Location, label: f64) -> Self {
        Self { location, label }
    }

    /// Whether the sample falls on the "≤ 0" side of the decision boundary
    pub fn is_non_positive(&self) -> bool {
        self.label <= 0.0
    }
}

/// Ordered, non-empty set of labeled sample points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Build a sample set from parallel location and label sequences.
    pub fn new(locations: Vec<Location>, labels: Vec<f64>) -> ClassifierResult<Self> {
        if locations.len() != labels.len() {
            return Err(ClassifierError::InvalidInput(format!(
                "{} locations but {} labels",
                locations.len(),
                labels.len()
            )));
        }
        let samples = locations
            .into_iter()
            .zip(labels)
            .map(|(location, label)| Sample { location, label })
            .collect();
        Self::from_samples(samples)
    }

    pub fn from_samples(samples: Vec<Sample>) -> ClassifierResult<Self> {
        if samples.is_empty() {
            return Err(ClassifierError::InvalidInput(
                "sample set is empty".to_string(),
            ));
        }
        if let Some((idx, bad)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| !s.location.is_finite() || !s.label.is_finite())
        {
            return Err(ClassifierError::InvalidInput(format!(
                "sample {idx} is not finite: ({}, {}) -> {}",
                bad.location.x, bad.location.y, bad.label
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.samples.iter().map(|s| s.location).collect()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Samples with label ≤ 0
    pub fn non_positive(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.is_non_positive())
    }

    /// Samples with label > 0
    pub fn positive(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| !s.is_non_positive())
    }

    /// True when both classes are represented. Not enforced, but a
    /// single-class set makes the classification boundary meaningless.
    pub fn has_both_classes(&self) -> bool {
        self.non_positive().next().is_some() && self.positive().next().is_some()
    }
}

/// Raw regression output: one mean and one variance per query location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveSample {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
}

impl PredictiveSample {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Two-sided confidence level in the open interval (0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    pub fn new(level: f64) -> ClassifierResult<Self> {
        if !level.is_finite() || level <= 0.0 || level >= 1.0 {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "confidence level must lie in (0, 1), got {level}"
            )));
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Probability mass left in each tail: (1 - level) / 2
    pub fn tail_probability(&self) -> f64 {
        (1.0 - self.0) / 2.0
    }

    /// Probability level of the lower confidence boundary
    pub fn lower_threshold(&self) -> f64 {
        self.tail_probability()
    }

    /// Probability level of the upper confidence boundary
    pub fn upper_threshold(&self) -> f64 {
        1.0 - self.tail_probability()
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self(0.95)
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = ClassifierError;

    fn try_from(level: f64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<ConfidenceLevel> for f64 {
    fn from(level: ConfidenceLevel) -> Self {
        level.0
    }
}

/// Which decision boundary a curve set represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// P = lower tail threshold
    Lower,
    /// P = 0.5, the maximum-likelihood decision boundary
    Median,
    /// P = upper tail threshold
    Upper,
}

impl BoundaryKind {
    pub fn to_label(&self) -> &'static str {
        match self {
            BoundaryKind::Lower => "Lower confidence boundary",
            BoundaryKind::Median => "Median boundary",
            BoundaryKind::Upper => "Upper confidence boundary",
        }
    }
}

/// An ordered chain of points along an iso-line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Location>,
    /// The last point connects back to the first
    pub closed: bool,
}

impl Polyline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total arc length, including the closing segment for closed polylines.
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + last.distance(first),
            _ => open,
        }
    }
}

/// All polylines at which a probability field equals one threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurve {
    pub kind: BoundaryKind,
    pub level: f64,
    pub polylines: Vec<Polyline>,
}

impl BoundaryCurve {
    /// No crossing at this level. A valid outcome, not a failure.
    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &Location> {
        self.polylines.iter().flat_map(|p| p.points.iter())
    }
}

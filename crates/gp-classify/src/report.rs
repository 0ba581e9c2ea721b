//! Display sink: JSON or plain-text rendering of an evaluation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use classification_core::{BoundaryKind, Polyline, ProbabilityField, SampleSet};
use probabilistic_classifier::{CellClass, ConfidenceContourExtractor, Evaluation};
use serde::Serialize;

/// Light to dark, following P[G(x) ≤ 0]
const SHADES: &[u8] = b" .:-=+*#%@";

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryStats {
    pub kind: BoundaryKind,
    pub level: f64,
    pub polylines: usize,
    pub points: usize,
    pub length: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub confidence_level: f64,
    pub lower_threshold: f64,
    pub upper_threshold: f64,
    pub confidently_non_positive: usize,
    pub confidently_positive: usize,
    pub uncertain: usize,
    pub uncertain_fraction: f64,
    pub boundaries: Vec<BoundaryStats>,
    pub reference_length: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub samples: &'a SampleSet,
    pub evaluation: &'a Evaluation,
    /// True zero level set of the limit-state function
    pub reference_boundary: Vec<Polyline>,
}

impl<'a> Report<'a> {
    pub fn new(
        samples: &'a SampleSet,
        evaluation: &'a Evaluation,
        reference_boundary: Vec<Polyline>,
    ) -> Self {
        let extractor = ConfidenceContourExtractor::new(evaluation.confidence_level);
        let thresholds = extractor.thresholds();

        let (mut non_positive, mut positive, mut uncertain) = (0, 0, 0);
        for &p in evaluation.probability_field.values().values() {
            match extractor.classify(p) {
                CellClass::ConfidentlyNonPositive => non_positive += 1,
                CellClass::ConfidentlyPositive => positive += 1,
                CellClass::Uncertain => uncertain += 1,
            }
        }
        let total = evaluation.probability_field.values().len().max(1);

        let boundaries = evaluation
            .boundaries()
            .iter()
            .map(|b| BoundaryStats {
                kind: b.kind,
                level: b.level,
                polylines: b.polylines.len(),
                points: b.point_count(),
                length: b.polylines.iter().map(Polyline::length).sum(),
            })
            .collect();

        let summary = Summary {
            confidence_level: evaluation.confidence_level.value(),
            lower_threshold: thresholds.lower,
            upper_threshold: thresholds.upper,
            confidently_non_positive: non_positive,
            confidently_positive: positive,
            uncertain,
            uncertain_fraction: uncertain as f64 / total as f64,
            boundaries,
            reference_length: reference_boundary.iter().map(Polyline::length).sum(),
        };

        Self {
            generated_at: Utc::now(),
            summary,
            samples,
            evaluation,
            reference_boundary,
        }
    }
}

pub fn render_json(report: &Report<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &Report<'_>) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push_str("Probabilistic classification after regression\n");
    out.push_str(&format!(
        "Generated {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&shade_map(&report.evaluation.probability_field, report.samples));
    out.push_str(&format!(
        "\nshading: '{}' P = 0 ... '{}' P = 1    o sample g ≤ 0    x sample g > 0\n\n",
        SHADES[0] as char,
        SHADES[SHADES.len() - 1] as char
    ));

    out.push_str(&format!(
        "Confidence level {:.1}% (thresholds {:.4} / {:.4})\n",
        summary.confidence_level * 100.0,
        summary.lower_threshold,
        summary.upper_threshold
    ));
    out.push_str(&format!(
        "Cells: {} confidently ≤ 0, {} confidently > 0, {} uncertain ({:.1}%)\n",
        summary.confidently_non_positive,
        summary.confidently_positive,
        summary.uncertain,
        summary.uncertain_fraction * 100.0
    ));
    for b in &summary.boundaries {
        if b.polylines == 0 {
            out.push_str(&format!("{} (P = {:.4}): not crossed\n", b.kind.to_label(), b.level));
        } else {
            out.push_str(&format!(
                "{} (P = {:.4}): {} polyline(s), {} points, length {:.2}\n",
                b.kind.to_label(),
                b.level,
                b.polylines,
                b.points,
                b.length
            ));
        }
    }
    out.push_str(&format!(
        "True zero level set: {} polyline(s), length {:.2}\n",
        report.reference_boundary.len(),
        summary.reference_length
    ));

    out
}

/// Character raster of the probability field, top row = largest y.
fn shade_map(field: &ProbabilityField, samples: &SampleSet) -> String {
    let grid = field.grid();
    let (rows, cols) = grid.shape();
    let mut canvas: Vec<Vec<u8>> = (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| {
                    let p = field.probability_at(row, col).unwrap_or(0.0);
                    let idx = (p * (SHADES.len() - 1) as f64).round() as usize;
                    SHADES[idx.min(SHADES.len() - 1)]
                })
                .collect()
        })
        .collect();

    let bounds = grid.bounds();
    for sample in samples.samples() {
        if !bounds.contains(&sample.location) {
            continue;
        }
        let col = ((sample.location.x - bounds.x_min) / grid.cell_width()).round() as usize;
        let row = ((sample.location.y - bounds.y_min) / grid.cell_height()).round() as usize;
        canvas[row.min(rows - 1)][col.min(cols - 1)] = if sample.is_non_positive() { b'o' } else { b'x' };
    }

    let mut out = String::with_capacity(rows * (cols + 1));
    for line in canvas.iter().rev() {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use classification_core::{
        BoundaryCurve, Bounds, ConfidenceLevel, Location, QueryGrid, ScalarGrid,
    };

    fn evaluation() -> Evaluation {
        let grid = QueryGrid::square(Bounds::symmetric(1.0).unwrap(), 3).unwrap();
        let values = ScalarGrid::new(3, 3, vec![0.0, 0.5, 1.0, 0.0, 0.5, 1.0, 0.01, 0.5, 0.99]).unwrap();
        let curve = |kind, level| BoundaryCurve {
            kind,
            level,
            polylines: vec![],
        };
        Evaluation {
            confidence_level: ConfidenceLevel::default(),
            probability_field: ProbabilityField::new(grid, values).unwrap(),
            median_boundary: curve(BoundaryKind::Median, 0.5),
            lower_boundary: curve(BoundaryKind::Lower, 0.025),
            upper_boundary: curve(BoundaryKind::Upper, 0.975),
            predictive_field: None,
        }
    }

    fn samples() -> SampleSet {
        SampleSet::new(
            vec![Location::new(-1.0, 1.0), Location::new(1.0, -1.0)],
            vec![-2.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let samples = samples();
        let evaluation = evaluation();
        let report = Report::new(&samples, &evaluation, vec![]);

        assert_eq!(report.summary.confidently_non_positive, 3);
        assert_eq!(report.summary.confidently_positive, 3);
        assert_eq!(report.summary.uncertain, 3);
        assert!((report.summary.uncertain_fraction - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.summary.boundaries.len(), 3);
    }

    #[test]
    fn test_text_rendering() {
        let samples = samples();
        let evaluation = evaluation();
        let text = render_text(&Report::new(&samples, &evaluation, vec![]));

        let lines: Vec<&str> = text.lines().collect();
        // Top row is y = 1: sample o at x = -1, then P = 0.5 and 0.99
        assert_eq!(lines[3], "o+@");
        assert_eq!(lines[4], " +@");
        // Bottom row is y = -1: P = 0 and 0.5, sample x at x = 1
        assert_eq!(lines[5], " +x");
        assert!(text.contains("Median boundary (P = 0.5000): not crossed"));
        assert!(text.contains("Confidence level 95.0%"));
    }

    #[test]
    fn test_json_rendering() {
        let samples = samples();
        let evaluation = evaluation();
        let json = render_json(&Report::new(&samples, &evaluation, vec![])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["uncertain"], 3);
        assert_eq!(value["evaluation"]["confidence_level"], 0.95);
        assert!(value["evaluation"].get("predictive_field").is_none());
        assert_eq!(value["evaluation"]["median_boundary"]["kind"], "Median");
    }
}

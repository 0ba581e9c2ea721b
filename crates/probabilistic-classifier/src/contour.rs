//! Iso-line tracing on a regular grid (marching squares).
//!
//! A corner is inside when its value is ≥ the level. Crossings are linearly
//! interpolated along cell edges and ambiguous saddle cells are resolved with
//! the cell-centre average. Cells touching a NaN are skipped. Infinite values
//! take part like any other: +∞ is inside, -∞ is outside, and a crossing next
//! to an infinite endpoint sits on the finite one. Segments that share a
//! crossing edge are chained into polylines. Chains that end on the grid
//! border (or next to a skipped cell) are open, everything else is closed.

use std::collections::BTreeMap;

use classification_core::{ClassifierError, ClassifierResult, Location, Polyline, ScalarGrid};

/// A lattice edge, identified by its lower-left endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum EdgeId {
    /// (row, col) → (row, col + 1)
    Horizontal { row: usize, col: usize },
    /// (row, col) → (row + 1, col)
    Vertical { row: usize, col: usize },
}

struct Tracer<'a> {
    values: &'a ScalarGrid,
    xs: &'a [f64],
    ys: &'a [f64],
    level: f64,
}

impl Tracer<'_> {
    fn inside(&self, row: usize, col: usize) -> bool {
        self.values[(row, col)] >= self.level
    }

    fn crosses(&self, edge: EdgeId) -> bool {
        let ((r0, c0), (r1, c1)) = endpoints(edge);
        self.inside(r0, c0) != self.inside(r1, c1)
    }

    fn crossing_point(&self, edge: EdgeId) -> Location {
        let ((r0, c0), (r1, c1)) = endpoints(edge);
        let v0 = self.values[(r0, c0)];
        let v1 = self.values[(r1, c1)];
        let t = match (v0.is_infinite(), v1.is_infinite()) {
            (true, true) => 0.5,
            (true, false) => 1.0,
            (false, true) => 0.0,
            (false, false) if v1 == v0 => 0.5,
            (false, false) => ((self.level - v0) / (v1 - v0)).clamp(0.0, 1.0),
        };
        Location {
            x: self.xs[c0] + t * (self.xs[c1] - self.xs[c0]),
            y: self.ys[r0] + t * (self.ys[r1] - self.ys[r0]),
        }
    }

    fn cell_segments(&self, row: usize, col: usize, out: &mut Vec<(EdgeId, EdgeId)>) {
        let corners = [
            self.values[(row, col)],
            self.values[(row, col + 1)],
            self.values[(row + 1, col + 1)],
            self.values[(row + 1, col)],
        ];
        if corners.iter().any(|v| v.is_nan()) {
            return;
        }

        let bottom = EdgeId::Horizontal { row, col };
        let right = EdgeId::Vertical { row, col: col + 1 };
        let top = EdgeId::Horizontal { row: row + 1, col };
        let left = EdgeId::Vertical { row, col };

        let crossed: Vec<EdgeId> = [bottom, right, top, left]
            .into_iter()
            .filter(|&e| self.crosses(e))
            .collect();

        match crossed.len() {
            2 => out.push((crossed[0], crossed[1])),
            4 => {
                // Saddle: diagonal corners share a side of the level
                let bottom_left_inside = corners[0] >= self.level;
                // Opposing infinities average to NaN, which counts as outside
                let center_inside = corners.iter().sum::<f64>() / 4.0 >= self.level;
                if bottom_left_inside == center_inside {
                    // Cut off the bottom-right and top-left corners
                    out.push((bottom, right));
                    out.push((top, left));
                } else {
                    // Cut off the bottom-left and top-right corners
                    out.push((left, bottom));
                    out.push((right, top));
                }
            }
            _ => {}
        }
    }
}

fn endpoints(edge: EdgeId) -> ((usize, usize), (usize, usize)) {
    match edge {
        EdgeId::Horizontal { row, col } => ((row, col), (row, col + 1)),
        EdgeId::Vertical { row, col } => ((row, col), (row + 1, col)),
    }
}

/// Trace every polyline along which `values` equals `level`.
///
/// `xs` holds the column coordinates and `ys` the row coordinates. A level the
/// field never reaches produces an empty result.
pub fn trace_isolines(
    values: &ScalarGrid,
    xs: &[f64],
    ys: &[f64],
    level: f64,
) -> ClassifierResult<Vec<Polyline>> {
    if xs.len() != values.cols() || ys.len() != values.rows() {
        return Err(ClassifierError::InvalidInput(format!(
            "coordinate axes {} x {} do not match grid {:?}",
            ys.len(),
            xs.len(),
            values.shape()
        )));
    }
    if !level.is_finite() {
        return Err(ClassifierError::InvalidInput(format!(
            "contour level must be finite, got {level}"
        )));
    }

    let tracer = Tracer {
        values,
        xs,
        ys,
        level,
    };

    let mut segments = Vec::new();
    for row in 0..values.rows().saturating_sub(1) {
        for col in 0..values.cols().saturating_sub(1) {
            tracer.cell_segments(row, col, &mut segments);
        }
    }

    Ok(join_segments(&tracer, &segments))
}

fn join_segments(tracer: &Tracer<'_>, segments: &[(EdgeId, EdgeId)]) -> Vec<Polyline> {
    let mut adjacency: BTreeMap<EdgeId, Vec<usize>> = BTreeMap::new();
    for (idx, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(idx);
        adjacency.entry(b).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();

    // Open chains start at edges touched by a single segment
    let ends: Vec<EdgeId> = adjacency
        .iter()
        .filter(|(_, segs)| segs.len() == 1)
        .map(|(&edge, _)| edge)
        .collect();
    for start in ends {
        if used[adjacency[&start][0]] {
            continue;
        }
        let (edges, closed) = walk(start, segments, &adjacency, &mut used);
        polylines.push(to_polyline(tracer, &edges, closed));
    }

    // Whatever remains forms closed loops
    for idx in 0..segments.len() {
        if used[idx] {
            continue;
        }
        let (edges, closed) = walk(segments[idx].0, segments, &adjacency, &mut used);
        polylines.push(to_polyline(tracer, &edges, closed));
    }

    polylines
}

fn walk(
    start: EdgeId,
    segments: &[(EdgeId, EdgeId)],
    adjacency: &BTreeMap<EdgeId, Vec<usize>>,
    used: &mut [bool],
) -> (Vec<EdgeId>, bool) {
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(seg) = adjacency[&current].iter().copied().find(|&s| !used[s]) else {
            return (path, false);
        };
        used[seg] = true;
        let (a, b) = segments[seg];
        let next = if a == current { b } else { a };
        if next == start {
            return (path, true);
        }
        path.push(next);
        current = next;
    }
}

fn to_polyline(tracer: &Tracer<'_>, edges: &[EdgeId], closed: bool) -> Polyline {
    Polyline {
        points: edges.iter().map(|&e| tracer.crossing_point(e)).collect(),
        closed,
    }
}

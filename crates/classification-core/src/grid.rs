//! Query lattice geometry and row-major scalar grids.

use std::ops::Index;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ClassifierError, ClassifierResult, Location};

/// Axis-aligned domain extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> ClassifierResult<Self> {
        let bounds = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// The square `[-half_width, half_width]²`
    pub fn symmetric(half_width: f64) -> ClassifierResult<Self> {
        Self::new(-half_width, half_width, -half_width, half_width)
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        let finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "bounds must be finite with min < max, got x [{}, {}], y [{}, {}]",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, location: &Location) -> bool {
        (self.x_min..=self.x_max).contains(&location.x)
            && (self.y_min..=self.y_max).contains(&location.y)
    }
}

/// Regular lattice over a bounding box. Row index follows y, column index follows x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryGrid {
    bounds: Bounds,
    rows: usize,
    cols: usize,
}

impl QueryGrid {
    pub fn new(bounds: Bounds, rows: usize, cols: usize) -> ClassifierResult<Self> {
        bounds.validate()?;
        if rows < 2 || cols < 2 {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "grid needs at least 2 points per axis, got {rows} x {cols}"
            )));
        }
        Ok(Self { bounds, rows, cols })
    }

    /// Same resolution along both axes
    pub fn square(bounds: Bounds, resolution: usize) -> ClassifierResult<Self> {
        Self::new(bounds, resolution, resolution)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x_coords(&self) -> Vec<f64> {
        linspace(self.bounds.x_min, self.bounds.x_max, self.cols)
    }

    pub fn y_coords(&self) -> Vec<f64> {
        linspace(self.bounds.y_min, self.bounds.y_max, self.rows)
    }

    pub fn cell_width(&self) -> f64 {
        self.bounds.width() / (self.cols - 1) as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.bounds.height() / (self.rows - 1) as f64
    }

    pub fn location(&self, row: usize, col: usize) -> Location {
        let x = if col + 1 == self.cols {
            self.bounds.x_max
        } else {
            self.bounds.x_min + col as f64 * self.cell_width()
        };
        let y = if row + 1 == self.rows {
            self.bounds.y_max
        } else {
            self.bounds.y_min + row as f64 * self.cell_height()
        };
        Location { x, y }
    }

    /// All lattice locations in row-major order
    pub fn locations(&self) -> Vec<Location> {
        let xs = self.x_coords();
        let ys = self.y_coords();
        ys.iter()
            .flat_map(|&y| xs.iter().map(move |&x| Location { x, y }))
            .collect()
    }

    /// Evaluate a function at every lattice location.
    pub fn sample<F>(&self, f: F) -> ScalarGrid
    where
        F: Fn(Location) -> f64,
    {
        ScalarGrid::from_fn(self.rows, self.cols, |row, col| f(self.location(row, col)))
    }
}

// Deserialised grids go through the same validation as `QueryGrid::new`
impl<'de> Deserialize<'de> for QueryGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            bounds: Bounds,
            rows: usize,
            cols: usize,
        }

        let raw = Raw::deserialize(deserializer)?;
        QueryGrid::new(raw.bounds, raw.rows, raw.cols).map_err(serde::de::Error::custom)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i + 1 == n { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Row-major grid of scalar values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ScalarGrid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> ClassifierResult<Self> {
        if values.len() != rows * cols {
            return Err(ClassifierError::InvalidInput(format!(
                "{} values do not fill a {rows} x {cols} grid",
                values.len()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                values.push(f(row, col));
            }
        }
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn map<F>(&self, f: F) -> ScalarGrid
    where
        F: Fn(f64) -> f64,
    {
        ScalarGrid {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two grids of identical shape cell by cell.
    pub fn zip_map<F>(&self, other: &ScalarGrid, f: F) -> ClassifierResult<ScalarGrid>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != other.shape() {
            return Err(ClassifierError::InvalidInput(format!(
                "grid shapes differ: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(ScalarGrid {
            rows: self.rows,
            cols: self.cols,
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl<'de> Deserialize<'de> for ScalarGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            rows: usize,
            cols: usize,
            values: Vec<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        ScalarGrid::new(raw.rows, raw.cols, raw.values).map_err(serde::de::Error::custom)
    }
}

impl Index<(usize, usize)> for ScalarGrid {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols, "grid index out of range");
        &self.values[row * self.cols + col]
    }
}

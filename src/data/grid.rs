use thiserror::Error;

// ---------------------------------------------------------------------------
// WavelengthGrid – the shared sampling basis
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("wavelength range is empty or inverted: [{min}, {max}]")]
    EmptyRange { min: f64, max: f64 },

    #[error("wavelength bounds must be finite")]
    NonFinite,
}

/// `n` evenly spaced wavelengths (µm) spanning `[min, max]` inclusive.
///
/// Every [`FilterCurve`](super::model::FilterCurve) is sampled on exactly this
/// grid, so curves can be combined elementwise.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    points: Vec<f64>,
}

impl WavelengthGrid {
    pub fn new(min: f64, max: f64, n: usize) -> Result<Self, GridError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GridError::NonFinite);
        }
        if min >= max {
            return Err(GridError::EmptyRange { min, max });
        }
        if n < 2 {
            return Err(GridError::TooFewPoints(n));
        }

        let step = (max - min) / (n - 1) as f64;
        let mut points: Vec<f64> = (0..n).map(|i| min + i as f64 * step).collect();
        // Pin the last point so rounding never pushes it past `max`.
        points[n - 1] = max;

        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed grid; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.points[0]
    }

    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// The neutral curve (all ones) on this grid.
    pub fn ones(&self) -> Vec<f64> {
        vec![1.0; self.points.len()]
    }
}

//! Normalized saliency heatmap

use ndarray::Array2;

/// A 2-D saliency score grid with values in [0, 1]
///
/// Produced by [`crate::saliency::compute`]. After normalization the
/// maximum value is 1.0 unless the map is degenerate (all zeros). The
/// polarity convention is applied later by the renderer: lower rendered
/// value means higher saliency.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    values: Array2<f32>,
}

impl Heatmap {
    pub(crate) fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    /// Grid values
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// (rows, columns) of the grid
    pub fn shape(&self) -> (usize, usize) {
        let s = self.values.dim();
        (s.0, s.1)
    }

    /// Maximum score in the grid
    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0_f32, f32::max)
    }

    /// Whether every score is zero (the defined degenerate case)
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

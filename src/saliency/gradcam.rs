//! Importance-weighted activation combination
//!
//! The spatial rule weights each feature channel by the mean of its
//! gradient over the spatial axes and sums the weighted channels. The
//! token rule drops the leading aggregate token, pools the gradient over
//! the token axis, and scores each token by the pooled-gradient-weighted
//! sum over its embedding, reshaping the scores into a square grid.

use super::{ActivationMap, CapturedPair, Heatmap};
use crate::{Error, Result};
use ndarray::{Array2, Axis, s};

/// Combine a captured pair into a normalized heatmap
///
/// The combined map is rectified (negatives clamped to zero) and divided
/// by its maximum. A zero maximum yields the all-zero heatmap rather than
/// NaN; callers may treat that as a degenerate-map warning.
pub fn compute(pair: &CapturedPair) -> Result<Heatmap> {
    let raw = match (pair.activation(), pair.gradient()) {
        (ActivationMap::Spatial(act), ActivationMap::Spatial(grad)) => spatial_map(act, grad),
        (ActivationMap::Token(act), ActivationMap::Token(grad)) => token_map(act, grad)?,
        // CapturedPair construction guarantees matching topology
        _ => unreachable!("mismatched topologies rejected at pairing"),
    };

    Ok(Heatmap::new(normalize(raw)))
}

/// Spatial rule: per-channel gradient mean weights the channel's map
fn spatial_map(act: &ndarray::Array3<f32>, grad: &ndarray::Array3<f32>) -> Array2<f32> {
    let (channels, height, width) = act.dim();
    let spatial_len = (height * width) as f32;

    let mut map = Array2::<f32>::zeros((height, width));
    for c in 0..channels {
        let weight = grad.index_axis(Axis(0), c).sum() / spatial_len;
        map.scaled_add(weight, &act.index_axis(Axis(0), c));
    }
    map
}

/// Token rule: pooled gradient scores each token, reshaped to a square grid
fn token_map(act: &ndarray::Array2<f32>, grad: &ndarray::Array2<f32>) -> Result<Array2<f32>> {
    // Position 0 is the aggregate token by convention; it carries no
    // spatial location and is excluded before reshaping.
    let act = act.slice(s![1.., ..]);
    let grad = grad.slice(s![1.., ..]);

    let tokens = act.nrows();
    let side = square_side(tokens).ok_or(Error::NonSquareTokenCount { tokens })?;

    // Mean gradient across the token axis, one value per embedding dim
    let token_count = tokens as f32;
    let pooled = grad.sum_axis(Axis(0)) / token_count;

    let scores: Vec<f32> = act.rows().into_iter().map(|row| row.dot(&pooled)).collect();

    Array2::from_shape_vec((side, side), scores).map_err(|_| Error::NonSquareTokenCount { tokens })
}

/// Integer square root, `None` when n is 0 or not a perfect square
fn square_side(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let side = (n as f64).sqrt().round() as usize;
    (side * side == n).then_some(side)
}

/// Rectify and scale to [0, 1], guarding the zero-maximum case
fn normalize(mut map: Array2<f32>) -> Array2<f32> {
    map.mapv_inplace(|v| v.max(0.0));
    let max = map.iter().copied().fold(0.0_f32, f32::max);
    if max > 0.0 {
        map.mapv_inplace(|v| v / max);
    }
    map
}

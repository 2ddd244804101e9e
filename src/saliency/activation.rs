//! Tagged activation topologies
//!
//! An intermediate tensor captured from a model is either a convolutional
//! spatial grid or a transformer token sequence. The two topologies need
//! different combination rules, so the distinction is a tagged variant
//! rather than runtime shape inspection scattered through the algorithm.

use crate::{Error, Result};
use ndarray::{Array2, Array3, ArrayD, Ix3, Ix4};

/// One captured layer tensor, tagged by topology
///
/// Batched raw captures are reduced to batch position 0 at construction;
/// the combination rules operate on a single sample.
#[derive(Clone, Debug)]
pub enum ActivationMap {
    /// Convolutional feature maps: (channels, height, width)
    Spatial(Array3<f32>),

    /// Token embeddings: (tokens, embedding)
    Token(Array2<f32>),
}

impl ActivationMap {
    /// Construct a spatial map, rejecting empty axes
    pub fn spatial(data: Array3<f32>) -> Result<Self> {
        if data.shape().contains(&0) {
            return Err(Error::ShapeMismatch {
                expected: vec![1, 1, 1],
                got: data.shape().to_vec(),
            });
        }
        Ok(Self::Spatial(data))
    }

    /// Construct a token map, rejecting empty axes
    pub fn token(data: Array2<f32>) -> Result<Self> {
        if data.shape().contains(&0) {
            return Err(Error::ShapeMismatch {
                expected: vec![1, 1],
                got: data.shape().to_vec(),
            });
        }
        Ok(Self::Token(data))
    }

    /// Classify a raw captured tensor by rank
    ///
    /// Rank 4 is (batch, channel, height, width); rank 3 is
    /// (batch, tokens, embedding). Batch position 0 is taken. Any other
    /// rank is unsupported.
    pub fn from_dyn(raw: &ArrayD<f32>) -> Result<Self> {
        match raw.ndim() {
            4 => {
                let view = raw
                    .view()
                    .into_dimensionality::<Ix4>()
                    .map_err(|_| Error::UnsupportedActivationRank { rank: raw.ndim() })?;
                Self::spatial(view.index_axis(ndarray::Axis(0), 0).to_owned())
            }
            3 => {
                let view = raw
                    .view()
                    .into_dimensionality::<Ix3>()
                    .map_err(|_| Error::UnsupportedActivationRank { rank: raw.ndim() })?;
                Self::token(view.index_axis(ndarray::Axis(0), 0).to_owned())
            }
            rank => Err(Error::UnsupportedActivationRank { rank }),
        }
    }

    /// Shape of the underlying grid
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Spatial(a) => a.shape().to_vec(),
            Self::Token(a) => a.shape().to_vec(),
        }
    }

    fn same_topology(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Spatial(_), Self::Spatial(_)) | (Self::Token(_), Self::Token(_))
        )
    }
}

/// Activation and gradient from the same forward/backward cycle
///
/// The pairing invariant is enforced at two levels: the probe handle only
/// yields a pair after driving one complete cycle, and this constructor
/// rejects mismatched topologies or shapes.
#[derive(Clone, Debug)]
pub struct CapturedPair {
    activation: ActivationMap,
    gradient: ActivationMap,
    class_index: usize,
}

impl CapturedPair {
    /// Pair an activation with its gradient, validating shapes match
    pub fn new(activation: ActivationMap, gradient: ActivationMap, class_index: usize) -> Result<Self> {
        if !activation.same_topology(&gradient) || activation.shape() != gradient.shape() {
            return Err(Error::ShapeMismatch {
                expected: activation.shape(),
                got: gradient.shape(),
            });
        }
        Ok(Self {
            activation,
            gradient,
            class_index,
        })
    }

    /// Pair raw captured tensors, classifying topology by rank
    pub fn from_dyn(activation: &ArrayD<f32>, gradient: &ArrayD<f32>, class_index: usize) -> Result<Self> {
        Self::new(
            ActivationMap::from_dyn(activation)?,
            ActivationMap::from_dyn(gradient)?,
            class_index,
        )
    }

    /// The captured activation
    pub fn activation(&self) -> &ActivationMap {
        &self.activation
    }

    /// The captured gradient
    pub fn gradient(&self) -> &ActivationMap {
        &self.gradient
    }

    /// Class index the backward pass targeted
    pub fn class_index(&self) -> usize {
        self.class_index
    }
}

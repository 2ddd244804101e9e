//! Error types for Explicar

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Token count {tokens} is not a perfect square; cannot reshape into a grid")]
    NonSquareTokenCount { tokens: usize },

    #[error("Unsupported activation rank {rank}: expected rank 4 (spatial) or rank 3 (token)")]
    UnsupportedActivationRank { rank: usize },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Probe already attached to layer '{layer}'; detach before re-attaching")]
    ProbeAlreadyActive { layer: String },

    #[error("Layer '{0}' not found in model")]
    LayerNotFound(String),

    #[error("Backward pass requested before any forward pass")]
    BackwardWithoutForward,

    #[error("Fewer than two distinct classes in validation labels; ROC curve undefined")]
    InsufficientClassDiversity,

    #[error("Checkpoint not found: {0}")]
    MissingCheckpoint(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

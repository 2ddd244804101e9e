//! # Explicar: Saliency-Instrumented Training
//!
//! Explicar trains image classifiers while explaining them: every run
//! produces Grad-CAM saliency overlays, confusion and ROC plots, and
//! resumable checkpoints, with each artifact family pruned to the
//! top-scoring few on disk.
//!
//! ## Architecture
//!
//! - **saliency**: Grad-CAM heatmaps for spatial and token activations
//! - **probe**: Single-shot activation/gradient capture from a model layer
//! - **retain**: Bounded top-K retention of scored artifact files
//! - **train**: Epoch loop, checkpointing, and run configuration
//! - **model**: Model traits and the built-in reference classifier
//! - **optim**: Optimizers (SGD, Adam) with checkpointable state
//! - **metrics**: Accuracy, confusion matrix, ROC/AUC
//! - **plot**: PNG rendering of evaluation artifacts
//! - **config**: Declarative YAML configuration and CLI
//! - **data**: Batch sources and the synthetic blob dataset

pub mod config;
pub mod data;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod plot;
pub mod probe;
pub mod retain;
pub mod saliency;
pub mod tensor;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use error::{Error, Result};
pub use tensor::Tensor;

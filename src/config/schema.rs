//! YAML schema for declarative run configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete run specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// Model configuration
    #[serde(default)]
    pub model: ModelSpec,

    /// Data configuration
    #[serde(default)]
    pub data: DataSpec,

    /// Optimizer configuration
    #[serde(default)]
    pub optimizer: OptimSpec,

    /// Training hyperparameters
    #[serde(default)]
    pub training: TrainingParams,
}

/// Reference classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Convolution filter count
    pub filters: usize,

    /// Output class count
    pub classes: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            filters: 8,
            classes: 2,
        }
    }
}

/// Synthetic dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSpec {
    /// Samples per split
    pub samples: usize,

    /// Square image side length
    pub image_size: usize,

    /// Batch size
    pub batch_size: usize,

    /// Dataset seed; the validation split uses `seed + 1`
    #[serde(default)]
    pub seed: u64,
}

impl Default for DataSpec {
    fn default() -> Self {
        Self {
            samples: 64,
            image_size: 16,
            batch_size: 8,
            seed: 0,
        }
    }
}

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimSpec {
    /// Optimizer name ("adam" or "sgd")
    pub name: String,

    /// Learning rate
    pub lr: f32,

    /// Extra optimizer parameters ("momentum" for sgd)
    #[serde(default)]
    pub params: HashMap<String, f32>,
}

impl Default for OptimSpec {
    fn default() -> Self {
        Self {
            name: "sgd".to_string(),
            lr: 0.1,
            params: HashMap::new(),
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Number of epochs
    pub epochs: usize,

    /// Plot cadence in epochs
    #[serde(default = "default_visualize_every")]
    pub visualize_every: usize,

    /// Retained artifacts per family
    #[serde(default = "default_keep_top")]
    pub keep_top: usize,

    /// Run output directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Layer captured for saliency maps
    #[serde(default = "default_saliency_layer")]
    pub saliency_layer: String,

    /// Validation samples visualized per saliency pass
    #[serde(default = "default_saliency_samples")]
    pub saliency_samples: usize,
}

fn default_visualize_every() -> usize {
    2
}

fn default_keep_top() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("runs")
}

fn default_saliency_layer() -> String {
    "conv1".to_string()
}

fn default_saliency_samples() -> usize {
    4
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 10,
            visualize_every: default_visualize_every(),
            keep_top: default_keep_top(),
            output_dir: default_output_dir(),
            saliency_layer: default_saliency_layer(),
            saliency_samples: default_saliency_samples(),
        }
    }
}

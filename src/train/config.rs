//! Training run configuration

use std::path::PathBuf;

/// Knobs for a training run, built fluently from defaults
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Total epochs to reach, counting any resumed progress
    pub epochs: usize,

    /// Produce saliency and evaluation plots every N epochs
    pub visualize_every: usize,

    /// Retained artifacts per family
    pub keep_top: usize,

    /// Root directory for checkpoints, plots, and the run log
    pub output_dir: PathBuf,

    /// Layer captured for saliency maps
    pub saliency_layer: String,

    /// Validation samples visualized per saliency pass
    pub saliency_samples: usize,

    /// Suppress per-epoch console output
    pub quiet: bool,
}

impl TrainConfig {
    pub fn new(epochs: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            epochs,
            visualize_every: 2,
            keep_top: 3,
            output_dir: output_dir.into(),
            saliency_layer: "conv1".to_string(),
            saliency_samples: 4,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_visualize_every(mut self, every: usize) -> Self {
        self.visualize_every = every.max(1);
        self
    }

    pub fn with_keep_top(mut self, keep: usize) -> Self {
        self.keep_top = keep;
        self
    }

    pub fn with_saliency_layer(mut self, layer: impl Into<String>) -> Self {
        self.saliency_layer = layer.into();
        self
    }

    pub fn with_saliency_samples(mut self, samples: usize) -> Self {
        self.saliency_samples = samples;
        self
    }

    pub fn models_dir(&self) -> PathBuf {
        self.output_dir.join("models")
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.output_dir.join("plots")
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join("training_log.txt")
    }
}

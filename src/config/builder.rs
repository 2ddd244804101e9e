//! Construct runtime objects from a validated specification

use super::schema::{ModelSpec, OptimSpec, TrainingParams};
use crate::model::TinyConvNet;
use crate::optim::{Adam, Optimizer, SGD};
use crate::train::TrainConfig;
use std::path::Path;

pub fn build_model(spec: &ModelSpec, seed: u64) -> TinyConvNet {
    TinyConvNet::new(spec.filters, spec.classes, seed)
}

/// Build the optimizer named in the run configuration.
///
/// Unknown names fall back to SGD; [`super::validate_config`] rejects
/// them before this point on the CLI path.
pub fn build_optimizer(spec: &OptimSpec) -> Box<dyn Optimizer> {
    match spec.name.as_str() {
        "adam" => Box::new(Adam::default_params(spec.lr)),
        _ => {
            let momentum = spec.params.get("momentum").copied().unwrap_or(0.0);
            Box::new(SGD::new(spec.lr, momentum))
        }
    }
}

pub fn build_train_config(params: &TrainingParams, output_dir: &Path, quiet: bool) -> TrainConfig {
    TrainConfig::new(params.epochs, output_dir)
        .with_visualize_every(params.visualize_every)
        .with_keep_top(params.keep_top)
        .with_saliency_layer(params.saliency_layer.clone())
        .with_saliency_samples(params.saliency_samples)
        .with_quiet(quiet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_build_adam() {
        let spec = OptimSpec {
            name: "adam".to_string(),
            lr: 0.001,
            params: HashMap::new(),
        };
        let opt = build_optimizer(&spec);
        assert_eq!(opt.state().name, "adam");
        assert_eq!(opt.lr(), 0.001);
    }

    #[test]
    fn test_build_sgd_with_momentum() {
        let mut params = HashMap::new();
        params.insert("momentum".to_string(), 0.9);
        let spec = OptimSpec {
            name: "sgd".to_string(),
            lr: 0.1,
            params,
        };
        let opt = build_optimizer(&spec);
        assert_eq!(opt.state().name, "sgd");
    }

    #[test]
    fn test_build_train_config_carries_params() {
        let params = TrainingParams::default();
        let config = build_train_config(&params, Path::new("/tmp/out"), true);
        assert_eq!(config.epochs, 10);
        assert!(config.quiet);
        assert_eq!(config.saliency_layer, "conv1");
    }
}

//! Declarative YAML configuration
//!
//! A run is described by a small YAML document and launched from the
//! CLI, with flag overrides applied on top.
//!
//! # Example
//!
//! ```yaml
//! model:
//!   filters: 8
//!   classes: 2
//!
//! data:
//!   samples: 64
//!   image_size: 16
//!   batch_size: 8
//!
//! optimizer:
//!   name: adam
//!   lr: 1e-3
//!
//! training:
//!   epochs: 10
//!   keep_top: 3
//! ```

mod builder;
mod cli;
mod schema;
mod validate;

pub use builder::{build_model, build_optimizer, build_train_config};
pub use cli::{apply_overrides, parse_args, Cli, Command, InfoArgs, TrainArgs, ValidateArgs};
pub use schema::{DataSpec, ModelSpec, OptimSpec, RunSpec, TrainingParams};
pub use validate::{validate_config, ValidationError};

use crate::{Error, Result};
use std::path::Path;

/// Load and parse a YAML run specification
pub fn load_config(path: &Path) -> Result<RunSpec> {
    let text = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
}

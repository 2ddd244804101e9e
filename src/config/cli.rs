//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! explicar train config.yaml
//! explicar train config.yaml --epochs 10 --output-dir ./runs
//! explicar train config.yaml --resume checkpoint.json
//! explicar validate config.yaml
//! explicar info config.yaml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Explicar: saliency-instrumented training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "explicar")]
#[command(version)]
#[command(about = "Train a classifier with Grad-CAM saliency maps and bounded artifact retention")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display information about a configuration
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Resume training from checkpoint
    #[arg(short, long)]
    pub resume: Option<PathBuf>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Model initialization seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Validate and print the effective config without training
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Parse from an explicit argument list
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a loaded specification
pub fn apply_overrides(spec: &mut super::RunSpec, args: &TrainArgs) {
    if let Some(dir) = &args.output_dir {
        spec.training.output_dir = dir.clone();
    }
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    // seed and resume stay CLI-only, never persisted in the config
}

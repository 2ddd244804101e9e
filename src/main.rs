//! Explicar CLI
//!
//! Single-command entry point for saliency-instrumented training runs.
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! explicar train config.yaml
//!
//! # Train with overrides
//! explicar train config.yaml --epochs 10 --output-dir ./runs
//!
//! # Resume from a checkpoint
//! explicar train config.yaml --resume runs/run_20260826_120000/models/checkpoint_epoch_4_acc_0.8200.json
//!
//! # Validate config
//! explicar validate config.yaml
//!
//! # Show config info
//! explicar info config.yaml
//! ```

use clap::Parser;
use explicar::config::{
    apply_overrides, build_model, build_optimizer, build_train_config, load_config,
    validate_config, Cli, Command, InfoArgs, TrainArgs, ValidateArgs,
};
use explicar::data::BlobDataset;
use explicar::train::Trainer;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    let result = match cli.command {
        Command::Train(args) => run_train(args, log_level),
        Command::Validate(args) => run_validate(args, log_level),
        Command::Info(args) => run_info(args, log_level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Explicar: Training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    if args.dry_run {
        log(
            level,
            LogLevel::Normal,
            "Dry run - config validated successfully",
        );
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Model: {} filters, {} classes",
                spec.model.filters, spec.model.classes
            ),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Optimizer: {} (lr={})",
                spec.optimizer.name, spec.optimizer.lr
            ),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!("  Epochs: {}", spec.training.epochs),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!("  Keep top: {}", spec.training.keep_top),
        );
        return Ok(());
    }

    let run_dir = spec.training.output_dir.join(format!(
        "run_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    log(
        level,
        LogLevel::Normal,
        &format!("Run directory: {}", run_dir.display()),
    );

    let seed = args.seed.unwrap_or(spec.data.seed);
    let model = build_model(&spec.model, seed);
    let optimizer = build_optimizer(&spec.optimizer);
    let config = build_train_config(&spec.training, &run_dir, level == LogLevel::Quiet);

    let mut trainer = match &args.resume {
        Some(checkpoint) => {
            log(
                level,
                LogLevel::Normal,
                &format!("Resuming from {}", checkpoint.display()),
            );
            Trainer::resume(model, optimizer, config, checkpoint)
                .map_err(|e| format!("Resume error: {e}"))?
        }
        None => Trainer::new(model, optimizer, config).map_err(|e| format!("Setup error: {e}"))?,
    };

    let mut train = BlobDataset::new(
        spec.data.samples,
        spec.data.image_size,
        spec.data.batch_size,
        spec.data.seed,
    );
    let mut val = BlobDataset::new(
        spec.data.samples,
        spec.data.image_size,
        spec.data.batch_size,
        spec.data.seed + 1,
    );

    let report = trainer
        .run(&mut train, &mut val)
        .map_err(|e| format!("Training error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete! Best validation accuracy: {:.4}",
            report.state.best_val_acc
        ),
    );
    for path in &report.checkpoints {
        log(
            level,
            LogLevel::Verbose,
            &format!("  Kept checkpoint: {}", path.display()),
        );
    }
    Ok(())
}

fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");
    Ok(())
}

fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration Info:");
    println!();
    println!("  Model: {} filters, {} classes", spec.model.filters, spec.model.classes);
    println!(
        "  Data: {} samples, {}x{} images, batch size {}",
        spec.data.samples, spec.data.image_size, spec.data.image_size, spec.data.batch_size
    );
    println!("  Optimizer: {} (lr={})", spec.optimizer.name, spec.optimizer.lr);
    println!("  Epochs: {}", spec.training.epochs);
    println!("  Plot cadence: every {} epochs", spec.training.visualize_every);
    println!("  Retained per family: {}", spec.training.keep_top);
    println!("  Saliency layer: {}", spec.training.saliency_layer);
    println!("  Output dir: {}", spec.training.output_dir.display());
    Ok(())
}

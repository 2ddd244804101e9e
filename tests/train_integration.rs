//! End-to-end training runs against the synthetic blob dataset

use explicar::data::BlobDataset;
use explicar::data::DataSource;
use explicar::model::{Model, TinyConvNet};
use explicar::probe::InstrumentedModel;
use explicar::optim::{Optimizer, SGD};
use explicar::retain::parse_artifact_name;
use explicar::train::{load_checkpoint, save_checkpoint, Checkpoint, TrainConfig, Trainer, TrainingState};
use std::path::Path;

fn config(epochs: usize, dir: &Path) -> TrainConfig {
    TrainConfig::new(epochs, dir)
        .with_saliency_samples(2)
        .with_quiet(true)
}

fn sources(seed: u64) -> (BlobDataset, BlobDataset) {
    (
        BlobDataset::new(16, 12, 8, seed),
        BlobDataset::new(16, 12, 8, seed + 1),
    )
}

#[test]
fn test_full_run_produces_log_and_bounded_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(4, dir.path());
    let mut trainer =
        Trainer::new(TinyConvNet::new(4, 2, 0), SGD::new(0.2, 0.9), cfg.clone()).unwrap();

    let (mut train, mut val) = sources(1);
    let report = trainer.run(&mut train, &mut val).unwrap();

    assert_eq!(report.state.epoch, 4);
    assert_eq!(report.state.history.len(), 4);

    // One log line per epoch, in the fixed format
    let log = std::fs::read_to_string(cfg.log_path()).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 4);
    for (i, line) in lines.iter().enumerate() {
        assert!(
            line.starts_with(&format!("Epoch {}/4, Train Loss: ", i + 1)),
            "unexpected log line: {line}"
        );
        assert!(line.contains(", Val Acc: "));
    }

    // Each artifact family stays within its bound and exists on disk
    assert!(report.checkpoints.len() <= 3);
    assert!(!report.checkpoints.is_empty());
    assert!(report.confusion_plots.len() <= 3);
    for path in report
        .checkpoints
        .iter()
        .chain(&report.confusion_plots)
        .chain(&report.roc_plots)
    {
        assert!(path.exists(), "missing retained artifact: {}", path.display());
    }

    // Checkpoint names parse back to their epoch and score
    for path in &report.checkpoints {
        let name = path.file_name().unwrap().to_str().unwrap();
        let (epoch, score) = parse_artifact_name(name).unwrap();
        assert!(epoch >= 1 && epoch <= 4);
        assert!((0.0..=1.0).contains(&score));
    }
}

#[test]
fn test_saliency_overlays_written_on_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(4, dir.path());
    let mut trainer =
        Trainer::new(TinyConvNet::new(4, 2, 0), SGD::new(0.2, 0.9), cfg.clone()).unwrap();

    let (mut train, mut val) = sources(3);
    trainer.run(&mut train, &mut val).unwrap();

    // Cadence of 2 over 4 epochs means overlays at epochs 2 and 4
    for epoch in [2, 4] {
        for sample in 0..2 {
            let path = cfg
                .plots_dir()
                .join(format!("gradcam_epoch_{epoch}_sample_{sample}.png"));
            assert!(path.exists(), "missing overlay: {}", path.display());
        }
    }
    assert!(!cfg
        .plots_dir()
        .join("gradcam_epoch_1_sample_0.png")
        .exists());
}

#[test]
fn test_roc_artifacts_scored_by_validation_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(4, dir.path());
    let mut trainer =
        Trainer::new(TinyConvNet::new(4, 2, 0), SGD::new(0.2, 0.9), cfg).unwrap();

    let (mut train, mut val) = sources(9);
    let report = trainer.run(&mut train, &mut val).unwrap();
    assert!(!report.roc_plots.is_empty());

    // Every retained ROC file carries its epoch's validation accuracy,
    // not the curve's AUC
    for path in &report.roc_plots {
        let name = path.file_name().unwrap().to_str().unwrap();
        let (epoch, score) = parse_artifact_name(name).unwrap();
        let val_acc = report.state.history[epoch - 1].val_acc;
        assert!(
            (score - val_acc).abs() < 5e-5,
            "{name} scored {score}, but epoch {epoch} val_acc was {val_acc}"
        );
    }
}

#[test]
fn test_training_curves_written_every_epoch() {
    let dir = tempfile::tempdir().unwrap();

    // A single epoch never reaches the cadence of 2, so the curves file
    // must come from the per-epoch path
    let cfg = config(1, dir.path());
    let mut trainer =
        Trainer::new(TinyConvNet::new(4, 2, 0), SGD::new(0.2, 0.9), cfg.clone()).unwrap();

    let (mut train, mut val) = sources(2);
    trainer.run(&mut train, &mut val).unwrap();

    assert!(cfg.plots_dir().join("training_plot.png").exists());
    assert!(!cfg
        .plots_dir()
        .join("gradcam_epoch_1_sample_0.png")
        .exists());
}

#[test]
fn test_resume_continues_after_checkpointed_epoch() {
    let dir = tempfile::tempdir().unwrap();

    // First run: 4 epochs
    let cfg_first = config(4, &dir.path().join("first"));
    let mut trainer = Trainer::new(
        TinyConvNet::new(4, 2, 0),
        SGD::new(0.2, 0.9),
        cfg_first.clone(),
    )
    .unwrap();
    let (mut train, mut val) = sources(5);
    let first = trainer.run(&mut train, &mut val).unwrap();

    let best = first
        .checkpoints
        .first()
        .expect("first run produced no checkpoint");
    let saved = load_checkpoint(best).unwrap();
    let saved_epoch = saved.training.epoch;
    let saved_best = saved.training.best_val_acc;
    let saved_history = saved.training.history.clone();

    // Resumed run: extend to 6 epochs from the saved checkpoint
    let cfg_second = config(6, &dir.path().join("second"));
    let mut resumed = Trainer::resume(
        TinyConvNet::new(4, 2, 99),
        SGD::new(0.2, 0.9),
        cfg_second,
        best,
    )
    .unwrap();
    assert_eq!(resumed.state().epoch, saved_epoch);
    assert_eq!(resumed.state().best_val_acc, saved_best);

    let report = resumed.run(&mut train, &mut val).unwrap();

    // Every new record comes after the checkpointed epoch, saved history
    // is intact, and the best accuracy never regresses
    assert_eq!(report.state.epoch, 6);
    assert_eq!(report.state.history[..saved_history.len()], saved_history);
    for record in &report.state.history[saved_history.len()..] {
        assert!(record.epoch > saved_epoch);
    }
    assert!(report.state.best_val_acc >= saved_best);
}

#[test]
fn test_resume_from_missing_checkpoint_fails_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let result = Trainer::resume(
        TinyConvNet::new(4, 2, 0),
        SGD::new(0.2, 0.9),
        config(4, dir.path()),
        &dir.path().join("no_such_checkpoint.json"),
    );
    assert!(matches!(
        result,
        Err(explicar::Error::MissingCheckpoint(_))
    ));
}

#[test]
fn test_checkpoint_file_round_trip_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let model = TinyConvNet::new(4, 2, 11);
    let mut opt = SGD::new(0.1, 0.9);

    // Take a step so the optimizer carries velocity buffers
    let mut model = model;
    let (mut train, _) = sources(7);
    let batch = &train.batches()[0];
    let logits = model.forward(&batch.images).unwrap();
    let (_, grad) = explicar::train::softmax_cross_entropy(&logits, &batch.labels);
    model.backward(&grad).unwrap();
    opt.step(model.params_mut());

    let checkpoint = Checkpoint {
        model: model.state(),
        optimizer: opt.state(),
        training: TrainingState::new(),
    };
    let path = dir.path().join("ckpt.json");
    save_checkpoint(&checkpoint, &path).unwrap();
    assert_eq!(load_checkpoint(&path).unwrap(), checkpoint);
}
